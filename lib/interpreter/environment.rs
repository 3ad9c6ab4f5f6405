use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use super::value::Value;

/// One scope of name bindings. The link to the enclosing scope is weak: a scope
/// can look names up in its parent but never keeps the parent alive.
#[derive(Debug)]
pub struct Environment {
    store: HashMap<String, Value>,
    outer: Option<Weak<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            store: HashMap::new(),
            outer: None,
        }))
    }

    pub fn new_enclosed_environment(outer: &Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            store: HashMap::new(),
            outer: Some(Rc::downgrade(outer)),
        }))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        match self.store.get(name) {
            Some(value) => Some(value.clone()),
            None => self
                .outer
                .as_ref()
                .and_then(Weak::upgrade)
                .and_then(|outer| outer.borrow().get(name)),
        }
    }

    /// Binds `name` in this scope, shadowing any outer binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.store.insert(name.to_string(), value);
    }

    /// Updates the innermost existing binding of `name`; when no scope has it,
    /// the name is created in this scope.
    pub fn assign(&mut self, name: &str, value: Value) {
        if self.store.contains_key(name) {
            self.store.insert(name.to_string(), value);
            return;
        }
        let value = match self.outer.as_ref().and_then(Weak::upgrade) {
            Some(outer) => match outer.borrow_mut().assign_existing(name, value) {
                Ok(()) => return,
                Err(value) => value,
            },
            None => value,
        };
        self.store.insert(name.to_string(), value);
    }

    fn assign_existing(&mut self, name: &str, value: Value) -> Result<(), Value> {
        if let Some(slot) = self.store.get_mut(name) {
            *slot = value;
            return Ok(());
        }
        match self.outer.as_ref().and_then(Weak::upgrade) {
            Some(outer) => outer.borrow_mut().assign_existing(name, value),
            None => Err(value),
        }
    }
}

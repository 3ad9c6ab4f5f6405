use std::{collections::HashMap, rc::Rc};

use crate::{ast::MethodDecl, error::NameError};

/// Declared methods by name, filled before any statement runs so that calls may
/// precede declarations.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, Rc<MethodDecl>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, method: Rc<MethodDecl>) -> Result<(), NameError> {
        if self.methods.contains_key(&method.name) {
            return Err(NameError::DuplicateMethod {
                name: method.name.clone(),
                position: method.position,
            });
        }
        tracing::debug!(method = %method.name, params = method.parameters.len(), "registered method");
        self.methods.insert(method.name.clone(), method);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Rc<MethodDecl>> {
        self.methods.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ast::TypeName, token::Position};

    fn method(name: &str, line: usize) -> Rc<MethodDecl> {
        Rc::new(MethodDecl {
            name: name.to_string(),
            parameters: vec![],
            return_type: TypeName::Void,
            is_static: false,
            body: vec![],
            position: Position::new(line, 1),
        })
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = MethodRegistry::new();
        registry.register(method("first", 1)).unwrap();
        registry.register(method("second", 2)).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("second").unwrap().position, Position::new(2, 1));
        assert!(registry.get("third").is_none());
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = MethodRegistry::new();
        registry.register(method("greet", 1)).unwrap();

        assert_eq!(
            registry.register(method("greet", 7)),
            Err(NameError::DuplicateMethod {
                name: "greet".to_string(),
                position: Position::new(7, 1),
            })
        );
        assert_eq!(registry.get("greet").unwrap().position, Position::new(1, 1));
    }
}

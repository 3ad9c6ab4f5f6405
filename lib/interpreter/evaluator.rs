use std::{
    cell::RefCell,
    collections::HashMap,
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::{
    ast::{
        AssignOperator, Expression, Import, Literal, MethodDecl, Operator, Program, Statement,
        UpdateOperator,
    },
    error::{JunoError, NameError, TypeError},
};

use super::{
    builtins::{Export, NativeFunction, PackageResolver},
    environment::Environment,
    output::Output,
    registry::MethodRegistry,
    value::Value,
};

type Result<T> = std::result::Result<T, JunoError>;

/// Fits the 2 MiB stack of a default spawned thread with room to spare.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

/// A flag shared with the host. Once set, the next evaluation step fails with
/// [`JunoError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum number of executed statements and loop increments; `None` is unbounded.
    pub step_budget: Option<u64>,
    pub max_call_depth: usize,
    pub cancellation: Option<Cancellation>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            step_budget: None,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            cancellation: None,
        }
    }
}

enum Flow {
    Next,
    Return(Value),
}

/// Tree-walking evaluator for one program run. Owns the root scope and the
/// method registry; both are dropped with the evaluator.
pub struct Evaluator<'a> {
    globals: Rc<RefCell<Environment>>,
    env: Rc<RefCell<Environment>>,
    registry: MethodRegistry,
    natives: HashMap<String, NativeFunction>,
    output: &'a mut dyn Output,
    resolver: &'a dyn PackageResolver,
    limits: Limits,
    steps: u64,
    call_stack: Vec<String>,
    entry_point: Option<Rc<MethodDecl>>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        output: &'a mut dyn Output,
        resolver: &'a dyn PackageResolver,
        limits: Limits,
    ) -> Self {
        let globals = Environment::new();
        Self {
            env: Rc::clone(&globals),
            globals,
            registry: MethodRegistry::new(),
            natives: HashMap::new(),
            output,
            resolver,
            limits,
            steps: 0,
            call_stack: Vec::new(),
            entry_point: None,
        }
    }

    /// Registers every method first, then runs the remaining statements in order.
    pub fn eval(&mut self, program: Program) -> Result<()> {
        for statement in &program.statements {
            self.register(statement)?;
        }
        if !self.registry.is_empty() {
            tracing::debug!(methods = self.registry.len(), "registered methods");
        }

        for statement in &program.statements {
            if let Flow::Return(_) = self.eval_statement(statement)? {
                return Ok(());
            }
        }

        if let Some(main) = self.entry_point.clone() {
            let args = vec![Value::Unit; main.parameters.len()];
            self.invoke(&main, args)?;
        }
        Ok(())
    }

    /// Statements executed so far, loop increments included.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Methods entered and not yet returned from, outermost first. After a
    /// failure this still holds the frames that were active when it happened.
    pub fn call_stack(&self) -> &[String] {
        &self.call_stack
    }

    fn register(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::MethodDecl(method) => self.registry.register(Rc::clone(method))?,
            Statement::Class { members, .. } => {
                for member in members {
                    if let Statement::MethodDecl(method) = member {
                        if method.is_static && method.name == "main" && self.entry_point.is_none() {
                            self.entry_point = Some(Rc::clone(method));
                        }
                    }
                    self.register(member)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn tick(&mut self) -> Result<()> {
        if let Some(cancellation) = &self.limits.cancellation {
            if cancellation.is_cancelled() {
                return Err(JunoError::Cancelled);
            }
        }
        if let Some(budget) = self.limits.step_budget {
            if self.steps >= budget {
                tracing::debug!(budget, "execution budget exhausted");
                return Err(JunoError::ExecutionBudgetExceeded { budget });
            }
        }
        self.steps += 1;
        Ok(())
    }

    fn eval_statement(&mut self, statement: &Statement) -> Result<Flow> {
        match statement {
            Statement::MethodDecl(_) => return Ok(Flow::Next),
            Statement::Class { members, .. } => {
                for member in members {
                    self.eval_statement(member)?;
                }
                return Ok(Flow::Next);
            }
            _ => self.tick()?,
        }

        match statement {
            Statement::VarDecl { name, value, .. } => {
                let value = self.eval_expression(value)?;
                self.env.borrow_mut().define(name, value);
            }
            Statement::Print(value) => {
                let line = match value {
                    Some(value) => self.eval_expression(value)?.to_string(),
                    None => String::new(),
                };
                self.output.write_line(&line)?;
            }
            Statement::If {
                condition,
                consequence,
                alternative,
            } => {
                return if self.eval_condition(condition)? {
                    self.eval_block(consequence)
                } else if let Some(alternative) = alternative {
                    self.eval_block(alternative)
                } else {
                    Ok(Flow::Next)
                };
            }
            Statement::For {
                init,
                condition,
                increment,
                body,
            } => return self.eval_for(init, condition, increment, body),
            Statement::Return(value) => {
                let value = match value {
                    Some(value) => self.eval_expression(value)?,
                    None => Value::Unit,
                };
                return Ok(Flow::Return(value));
            }
            Statement::Import(import) => self.eval_import(import),
            Statement::Expression(expression) => {
                self.eval_expression(expression)?;
            }
            Statement::MethodDecl(_) | Statement::Class { .. } => {}
        }
        Ok(Flow::Next)
    }

    fn eval_block(&mut self, statements: &[Statement]) -> Result<Flow> {
        for statement in statements {
            if let Flow::Return(value) = self.eval_statement(statement)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    fn eval_condition(&mut self, condition: &Expression) -> Result<bool> {
        match self.eval_expression(condition)? {
            Value::Bool(value) => Ok(value),
            other => Err(TypeError::NonBooleanCondition {
                found: other.describe(),
            }
            .into()),
        }
    }

    fn eval_for(
        &mut self,
        init: &Statement,
        condition: &Expression,
        increment: &Expression,
        body: &[Statement],
    ) -> Result<Flow> {
        if let Flow::Return(value) = self.eval_statement(init)? {
            return Ok(Flow::Return(value));
        }
        while self.eval_condition(condition)? {
            if let Flow::Return(value) = self.eval_block(body)? {
                return Ok(Flow::Return(value));
            }
            self.tick()?;
            self.eval_expression(increment)?;
        }
        Ok(Flow::Next)
    }

    /// Imports are program-wide wherever they appear: values land in the root
    /// scope and functions in the native call table.
    fn eval_import(&mut self, import: &Import) {
        let mut resolution = self.resolver.resolve(&import.package);
        if let Some(diagnostic) = &resolution.diagnostic {
            tracing::warn!(import = %import, "{}", diagnostic);
        }

        let exports: Vec<(String, Export)> = match &import.name {
            None => resolution.exports.into_iter().collect(),
            Some(name) => match resolution.exports.remove(name) {
                Some(export) => vec![(name.clone(), export)],
                None => {
                    if resolution.diagnostic.is_none() {
                        tracing::warn!(import = %import, "package `{}` has no export `{}`", import.package, name);
                    }
                    vec![]
                }
            },
        };

        for (name, export) in exports {
            tracing::debug!(package = %import.package, name = %name, "bound import");
            match export {
                Export::Value(value) => self.globals.borrow_mut().define(&name, value),
                Export::Function(function) => {
                    self.natives.insert(name, function);
                }
            }
        }
    }

    fn eval_expression(&mut self, expression: &Expression) -> Result<Value> {
        let value = match expression {
            Expression::Literal(literal) => match literal {
                Literal::String(value) => Value::String(value.clone()),
                Literal::Int(value) => Value::Int(*value),
                Literal::Float(value) => Value::Float(*value),
                Literal::Bool(value) => Value::Bool(*value),
            },
            Expression::Identifier(name) => self.eval_identifier(name)?,
            Expression::Prefix { operator, right } => {
                let right = self.eval_expression(right)?;
                eval_prefix_expression(*operator, right)?
            }
            Expression::Binary {
                left,
                operator: operator @ (Operator::And | Operator::Or),
                right,
            } => self.eval_logical_expression(left, *operator, right)?,
            Expression::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                eval_infix_expression(left, *operator, right)?
            }
            Expression::Call { name, arguments } => self.eval_call(name, arguments)?,
            Expression::Assign {
                name,
                operator,
                value,
            } => self.eval_assign(name, *operator, value)?,
            Expression::Update {
                name,
                operator,
                prefix,
            } => self.eval_update(name, *operator, *prefix)?,
            Expression::Array(elements) => Value::Array(
                elements
                    .iter()
                    .map(|e| self.eval_expression(e))
                    .collect::<Result<Vec<Value>>>()?,
            ),
            Expression::Index { left, index } => {
                let left = self.eval_expression(left)?;
                let index = self.eval_expression(index)?;
                eval_index(left, index)?
            }
        };
        Ok(value)
    }

    fn eval_identifier(&self, name: &str) -> Result<Value> {
        self.env.borrow().get(name).ok_or_else(|| {
            NameError::UndefinedVariable {
                name: name.to_string(),
            }
            .into()
        })
    }

    fn eval_logical_expression(
        &mut self,
        left: &Expression,
        operator: Operator,
        right: &Expression,
    ) -> Result<Value> {
        let left = self.eval_expression(left)?;
        match (operator, &left) {
            (Operator::And, Value::Bool(false)) => return Ok(Value::Bool(false)),
            (Operator::Or, Value::Bool(true)) => return Ok(Value::Bool(true)),
            _ => {}
        }
        let right = self.eval_expression(right)?;
        match (&left, &right) {
            (Value::Bool(_), Value::Bool(value)) => Ok(Value::Bool(*value)),
            _ => Err(invalid_operand(operator, &left, &right)),
        }
    }

    fn eval_call(&mut self, name: &str, arguments: &[Expression]) -> Result<Value> {
        let method = self.registry.get(name);
        let native = match method {
            Some(_) => None,
            None => match self.natives.get(name) {
                Some(function) => Some(*function),
                None => {
                    return Err(NameError::UndefinedMethod {
                        name: name.to_string(),
                    }
                    .into())
                }
            },
        };

        let args = arguments
            .iter()
            .map(|arg| self.eval_expression(arg))
            .collect::<Result<Vec<Value>>>()?;

        match (method, native) {
            (Some(method), _) => self.invoke(&method, args),
            (None, Some(function)) => function(args),
            (None, None) => Err(NameError::UndefinedMethod {
                name: name.to_string(),
            }
            .into()),
        }
    }

    #[tracing::instrument(level = "trace", skip_all, fields(method = %method.name, depth = self.call_stack.len()))]
    fn invoke(&mut self, method: &Rc<MethodDecl>, args: Vec<Value>) -> Result<Value> {
        if self.call_stack.len() >= self.limits.max_call_depth {
            return Err(JunoError::CallDepthExceeded {
                depth: self.limits.max_call_depth,
            });
        }

        let scope = Environment::new_enclosed_environment(&self.globals);
        {
            let mut scope = scope.borrow_mut();
            let mut args = args.into_iter();
            for parameter in &method.parameters {
                scope.define(&parameter.name, args.next().unwrap_or(Value::Unit));
            }
        }

        let caller = std::mem::replace(&mut self.env, scope);
        self.call_stack.push(method.name.clone());
        let flow = self.eval_block(&method.body);
        self.env = caller;

        let value = match flow? {
            Flow::Return(value) => value,
            Flow::Next => Value::Unit,
        };
        self.call_stack.pop();
        Ok(value)
    }

    fn eval_assign(
        &mut self,
        name: &str,
        operator: AssignOperator,
        value: &Expression,
    ) -> Result<Value> {
        let value = match operator {
            AssignOperator::Set => self.eval_expression(value)?,
            AssignOperator::Add | AssignOperator::Subtract => {
                let current = self.eval_identifier(name)?;
                let value = self.eval_expression(value)?;
                let operator = match operator {
                    AssignOperator::Add => Operator::Plus,
                    _ => Operator::Minus,
                };
                eval_infix_expression(current, operator, value)?
            }
        };
        self.env.borrow_mut().assign(name, value.clone());
        Ok(value)
    }

    fn eval_update(&mut self, name: &str, operator: UpdateOperator, prefix: bool) -> Result<Value> {
        let current = self.eval_identifier(name)?;
        let delta = match operator {
            UpdateOperator::Increment => 1,
            UpdateOperator::Decrement => -1,
        };
        let updated = match &current {
            Value::Int(value) => Value::Int(value.wrapping_add(delta)),
            Value::Float(value) => Value::Float(value + delta as f64),
            other => {
                return Err(TypeError::InvalidUnaryOperand {
                    operator: operator.to_string(),
                    operand: other.describe(),
                }
                .into())
            }
        };
        self.env.borrow_mut().assign(name, updated.clone());
        Ok(if prefix { updated } else { current })
    }
}

fn invalid_operand(operator: Operator, left: &Value, right: &Value) -> JunoError {
    TypeError::InvalidOperand {
        operator: operator.to_string(),
        left: left.describe(),
        right: right.describe(),
    }
    .into()
}

fn eval_prefix_expression(operator: Operator, right: Value) -> Result<Value> {
    match (operator, right) {
        (Operator::Not, Value::Bool(value)) => Ok(Value::Bool(!value)),
        (Operator::Minus, Value::Int(value)) => Ok(Value::Int(value.wrapping_neg())),
        (Operator::Minus, Value::Float(value)) => Ok(Value::Float(-value)),
        (operator, right) => Err(TypeError::InvalidUnaryOperand {
            operator: operator.to_string(),
            operand: right.describe(),
        }
        .into()),
    }
}

fn eval_infix_expression(left: Value, operator: Operator, right: Value) -> Result<Value> {
    match (&left, operator, &right) {
        (Value::String(_), Operator::Plus, _) | (_, Operator::Plus, Value::String(_)) => {
            Ok(Value::String(format!("{}{}", left, right)))
        }
        (_, Operator::Eq, _) => Ok(Value::Bool(left.loosely_equals(&right))),
        (_, Operator::NotEq, _) => Ok(Value::Bool(!left.loosely_equals(&right))),
        (Value::Int(l), operator, Value::Int(r)) => eval_integer_infix_expression(*l, operator, *r)
            .ok_or_else(|| invalid_operand(operator, &left, &right))?,
        (l, operator, r) if l.is_numeric() && r.is_numeric() => {
            match (l.as_f64(), r.as_f64()) {
                (Some(l), Some(r)) => eval_float_infix_expression(l, operator, r),
                _ => None,
            }
            .ok_or_else(|| invalid_operand(operator, &left, &right))
        }
        _ => Err(invalid_operand(operator, &left, &right)),
    }
}

/// `None` when the operator does not apply to integers.
fn eval_integer_infix_expression(left: i64, operator: Operator, right: i64) -> Option<Result<Value>> {
    let value = match operator {
        Operator::Plus => Value::Int(left.wrapping_add(right)),
        Operator::Minus => Value::Int(left.wrapping_sub(right)),
        Operator::Multiply => Value::Int(left.wrapping_mul(right)),
        Operator::Divide | Operator::Modulo if right == 0 => {
            return Some(Err(JunoError::DivisionByZero))
        }
        Operator::Divide => Value::Int(left.wrapping_div(right)),
        Operator::Modulo => Value::Int(left.wrapping_rem(right)),
        Operator::Lt => Value::Bool(left < right),
        Operator::LtEq => Value::Bool(left <= right),
        Operator::Gt => Value::Bool(left > right),
        Operator::GtEq => Value::Bool(left >= right),
        _ => return None,
    };
    Some(Ok(value))
}

fn eval_float_infix_expression(left: f64, operator: Operator, right: f64) -> Option<Value> {
    let value = match operator {
        Operator::Plus => Value::Float(left + right),
        Operator::Minus => Value::Float(left - right),
        Operator::Multiply => Value::Float(left * right),
        Operator::Divide => Value::Float(left / right),
        Operator::Modulo => Value::Float(left % right),
        Operator::Lt => Value::Bool(left < right),
        Operator::LtEq => Value::Bool(left <= right),
        Operator::Gt => Value::Bool(left > right),
        Operator::GtEq => Value::Bool(left >= right),
        _ => return None,
    };
    Some(value)
}

fn eval_index(left: Value, index: Value) -> Result<Value> {
    match (&left, &index) {
        (Value::Array(elements), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|position| elements.get(position))
            .cloned()
            .ok_or(JunoError::IndexOutOfBounds {
                index: *i,
                len: elements.len(),
            }),
        _ => Err(TypeError::NotIndexable {
            found: left.describe(),
            index: index.describe(),
        }
        .into()),
    }
}

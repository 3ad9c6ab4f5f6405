use std::{fmt, rc::Rc};

use crate::token::{Position, PrimitiveType, TokenKind};

#[derive(Debug, PartialEq, Clone)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TypeName {
    Void,
    Primitive(PrimitiveType),
    Array(Box<TypeName>),
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeName::Void => write!(f, "void"),
            TypeName::Primitive(ty) => write!(f, "{}", ty),
            TypeName::Array(ty) => write!(f, "{}[]", ty),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Parameter {
    pub ty: TypeName,
    pub name: String,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeName,
    pub is_static: bool,
    pub body: Vec<Statement>,
    pub position: Position,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Import {
    pub package: String,
    /// `None` for a wildcard import.
    pub name: Option<String>,
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}.{}", self.package, name),
            None => write!(f, "{}.*", self.package),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    VarDecl {
        ty: TypeName,
        name: String,
        value: Expression,
    },
    MethodDecl(Rc<MethodDecl>),
    Class {
        name: String,
        members: Vec<Statement>,
    },
    Print(Option<Expression>),
    If {
        condition: Expression,
        consequence: Vec<Statement>,
        alternative: Option<Vec<Statement>>,
    },
    For {
        init: Box<Statement>,
        condition: Expression,
        increment: Expression,
        body: Vec<Statement>,
    },
    Return(Option<Expression>),
    Import(Import),
    Expression(Expression),
}

fn write_block(f: &mut fmt::Formatter, statements: &[Statement]) -> fmt::Result {
    write!(f, "{{ ")?;
    for statement in statements {
        write!(f, "{} ", statement)?;
    }
    write!(f, "}}")
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::VarDecl { ty, name, value } => write!(f, "{} {} = {};", ty, name, value),
            Statement::MethodDecl(method) => {
                let parameters: Vec<String> = method
                    .parameters
                    .iter()
                    .map(|p| format!("{} {}", p.ty, p.name))
                    .collect();
                if method.is_static {
                    write!(f, "static ")?;
                }
                write!(
                    f,
                    "{} {}({}) ",
                    method.return_type,
                    method.name,
                    parameters.join(", ")
                )?;
                write_block(f, &method.body)
            }
            Statement::Class { name, members } => {
                write!(f, "class {} ", name)?;
                write_block(f, members)
            }
            Statement::Print(Some(value)) => write!(f, "println({});", value),
            Statement::Print(None) => write!(f, "println();"),
            Statement::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if {} ", condition)?;
                write_block(f, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else ")?;
                    write_block(f, alternative)?;
                }
                Ok(())
            }
            Statement::For {
                init,
                condition,
                increment,
                body,
            } => {
                write!(f, "for ({} {}; {}) ", init, condition, increment)?;
                write_block(f, body)
            }
            Statement::Return(Some(value)) => write!(f, "return {};", value),
            Statement::Return(None) => write!(f, "return;"),
            Statement::Import(import) => write!(f, "import {};", import),
            Statement::Expression(expression) => write!(f, "{}", expression),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::String(value) => write!(f, "\"{}\"", value),
            Literal::Int(value) => write!(f, "{}", value),
            Literal::Float(value) => write!(f, "{:?}", value),
            Literal::Bool(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Operator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    And,
    Or,
    Not,
}

impl Operator {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let operator = match kind {
            TokenKind::Plus => Operator::Plus,
            TokenKind::Minus => Operator::Minus,
            TokenKind::Asterisk => Operator::Multiply,
            TokenKind::Slash => Operator::Divide,
            TokenKind::Percent => Operator::Modulo,
            TokenKind::Lt => Operator::Lt,
            TokenKind::LtEq => Operator::LtEq,
            TokenKind::Gt => Operator::Gt,
            TokenKind::GtEq => Operator::GtEq,
            TokenKind::Eq => Operator::Eq,
            TokenKind::NotEq => Operator::NotEq,
            TokenKind::And => Operator::And,
            TokenKind::Or => Operator::Or,
            TokenKind::Bang => Operator::Not,
            _ => return None,
        };
        Some(operator)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::Lt => "<",
            Operator::LtEq => "<=",
            Operator::Gt => ">",
            Operator::GtEq => ">=",
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Not => "!",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AssignOperator {
    Set,
    Add,
    Subtract,
}

impl fmt::Display for AssignOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssignOperator::Set => write!(f, "="),
            AssignOperator::Add => write!(f, "+="),
            AssignOperator::Subtract => write!(f, "-="),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UpdateOperator {
    Increment,
    Decrement,
}

impl fmt::Display for UpdateOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UpdateOperator::Increment => write!(f, "++"),
            UpdateOperator::Decrement => write!(f, "--"),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    Prefix {
        operator: Operator,
        right: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        operator: Operator,
        right: Box<Expression>,
    },
    Call {
        name: String,
        arguments: Vec<Expression>,
    },
    Assign {
        name: String,
        operator: AssignOperator,
        value: Box<Expression>,
    },
    Update {
        name: String,
        operator: UpdateOperator,
        prefix: bool,
    },
    Array(Vec<Expression>),
    Index {
        left: Box<Expression>,
        index: Box<Expression>,
    },
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Literal(literal) => write!(f, "{}", literal),
            Expression::Identifier(name) => write!(f, "{}", name),
            Expression::Prefix { operator, right } => write!(f, "({}{})", operator, right),
            Expression::Binary {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::Call { name, arguments } => {
                let arguments: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", name, arguments.join(", "))
            }
            Expression::Assign {
                name,
                operator,
                value,
            } => write!(f, "{} {} {}", name, operator, value),
            Expression::Update {
                name,
                operator,
                prefix: true,
            } => write!(f, "{}{}", operator, name),
            Expression::Update {
                name,
                operator,
                prefix: false,
            } => write!(f, "{}{}", name, operator),
            Expression::Array(elements) => {
                let elements: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", elements.join(", "))
            }
            Expression::Index { left, index } => write!(f, "({}[{}])", left, index),
        }
    }
}

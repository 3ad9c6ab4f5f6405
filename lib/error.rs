use std::io;

use thiserror::Error;

use crate::token::Position;

/// Raised by the lexer and parser. Always aborts before any statement runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("unterminated string literal starting at {position}")]
    UnterminatedString { position: Position },
    #[error("unterminated block comment starting at {position}")]
    UnterminatedComment { position: Position },
    #[error("nesting deeper than {limit} levels at {position}")]
    NestingTooDeep { limit: usize, position: Position },
    #[error("unexpected {found} at {position}")]
    UnexpectedToken { found: String, position: Position },
    #[error("expected {expected}, found {found} at {position}")]
    ExpectedToken {
        expected: String,
        found: String,
        position: Position,
    },
}

impl SyntaxError {
    pub fn position(&self) -> Position {
        match self {
            SyntaxError::UnterminatedString { position }
            | SyntaxError::UnterminatedComment { position }
            | SyntaxError::NestingTooDeep { position, .. }
            | SyntaxError::UnexpectedToken { position, .. }
            | SyntaxError::ExpectedToken { position, .. } => *position,
        }
    }

    /// True when the source simply stopped early, e.g. inside an unclosed block.
    pub fn is_incomplete(&self) -> bool {
        match self {
            SyntaxError::UnterminatedString { .. } | SyntaxError::UnterminatedComment { .. } => true,
            SyntaxError::NestingTooDeep { .. } => false,
            SyntaxError::UnexpectedToken { found, .. } | SyntaxError::ExpectedToken { found, .. } => {
                found == "end of input"
            }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("undefined variable `{name}`")]
    UndefinedVariable { name: String },
    #[error("undefined method `{name}`")]
    UndefinedMethod { name: String },
    #[error("method `{name}` is declared more than once (again at {position})")]
    DuplicateMethod { name: String, position: Position },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid operands for `{operator}`: {left} and {right}")]
    InvalidOperand {
        operator: String,
        left: String,
        right: String,
    },
    #[error("invalid operand for `{operator}`: {operand}")]
    InvalidUnaryOperand { operator: String, operand: String },
    #[error("condition must be a boolean, found {found}")]
    NonBooleanCondition { found: String },
    #[error("{found} cannot be indexed by {index}")]
    NotIndexable { found: String, index: String },
    #[error("invalid arguments to `{function}`: {reason}")]
    InvalidArguments { function: String, reason: String },
}

/// Every way a call into the interpreter core can fail.
#[derive(Debug, Error)]
pub enum JunoError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("name error: {0}")]
    Name(#[from] NameError),
    #[error("type error: {0}")]
    Type(#[from] TypeError),
    #[error("execution budget of {budget} steps exceeded")]
    ExecutionBudgetExceeded { budget: u64 },
    #[error("execution cancelled")]
    Cancelled,
    #[error("maximum call depth of {depth} exceeded")]
    CallDepthExceeded { depth: usize },
    #[error("division by zero")]
    DivisionByZero,
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error("could not write output: {0}")]
    Output(#[from] io::Error),
}

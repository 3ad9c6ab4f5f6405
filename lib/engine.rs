use anyhow::Result;

use crate::{
    error::SyntaxError,
    interpreter::{evaluator::DEFAULT_MAX_CALL_DEPTH, Cancellation},
};

#[derive(Debug, Clone)]
pub struct Options {
    /// Log the parsed program and attach active method frames to errors.
    pub debug: bool,
    pub step_budget: Option<u64>,
    pub max_call_depth: usize,
    pub cancellation: Option<Cancellation>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            debug: false,
            step_budget: None,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            cancellation: None,
        }
    }
}

pub trait Engine {
    /// Lexes, parses and evaluates `input` against a fresh root scope.
    fn run(&mut self, input: &str) -> Result<()>;

    fn check(&self, input: &str) -> std::result::Result<(), SyntaxError> {
        crate::check_syntax(input)
    }
}

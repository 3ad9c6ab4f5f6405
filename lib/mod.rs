pub mod ast;
pub mod engine;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod token;

pub use engine::{Engine, Options};
pub use error::{JunoError, NameError, SyntaxError, TypeError};

use ast::Program;
use parser::Parser;

pub fn parse(input: &str) -> Result<Program, SyntaxError> {
    let tokens = lexer::tokenize(input)?;
    Parser::new(tokens).parse_program()
}

/// Lexes and parses without evaluating anything.
pub fn check_syntax(input: &str) -> Result<(), SyntaxError> {
    parse(input).map(|_| ())
}

/// Runs `input` with default options, printing to stdout. Failures are logged
/// and reported as `false`.
pub fn execute(input: &str) -> bool {
    match new_interpreter(Options::default()).run(input) {
        Ok(()) => true,
        Err(error) => {
            tracing::error!("{:#}", error);
            false
        }
    }
}

pub fn new_interpreter(options: Options) -> Box<dyn Engine> {
    interpreter::new_engine(options)
}

pub mod builtins;
pub mod environment;
pub mod evaluator;
pub mod output;
pub mod registry;
pub mod value;

use anyhow::Result;

pub use builtins::{Export, NativeFunction, NoPackages, PackageResolver, Resolution, StdPackages};
pub use evaluator::{Cancellation, Evaluator, Limits};
pub use output::{Output, SharedBuffer, Stdout};
pub use value::Value;

use crate::{error::JunoError, Engine, Options};

pub fn new_engine(options: Options) -> Box<dyn Engine> {
    Box::new(Interpreter::new(options))
}

/// An [`Engine`] that walks the syntax tree. Every `run` starts from an empty
/// root scope and an empty method registry.
pub struct Interpreter {
    options: Options,
    output: Box<dyn Output>,
    resolver: Box<dyn PackageResolver>,
}

impl Interpreter {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            output: Box::new(Stdout),
            resolver: Box::new(StdPackages),
        }
    }

    pub fn with_output(mut self, output: impl Output + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    pub fn with_resolver(mut self, resolver: impl PackageResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    fn limits(&self) -> Limits {
        Limits {
            step_budget: self.options.step_budget,
            max_call_depth: self.options.max_call_depth,
            cancellation: self.options.cancellation.clone(),
        }
    }
}

impl Engine for Interpreter {
    fn run(&mut self, input: &str) -> Result<()> {
        let program = crate::parse(input).map_err(JunoError::from)?;

        if self.options.debug {
            tracing::debug!(statements = program.statements.len(), ast = %program, "parsed program");
        }

        let limits = self.limits();
        let mut evaluator = Evaluator::new(self.output.as_mut(), self.resolver.as_ref(), limits);

        match evaluator.eval(program) {
            Ok(()) => {
                tracing::debug!(steps = evaluator.steps(), "program finished");
                Ok(())
            }
            Err(error) if self.options.debug && !evaluator.call_stack().is_empty() => {
                let frames = evaluator.call_stack().join(" -> ");
                Err(anyhow::Error::new(error).context(format!("in method frames: {}", frames)))
            }
            Err(error) => Err(error.into()),
        }
    }
}

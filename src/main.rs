mod repl;

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use juno::{interpreter::evaluator::DEFAULT_MAX_CALL_DEPTH, Options};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// log the parsed program and report method frames on failure
    #[arg(long, global = true)]
    debug: bool,

    /// only report errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// abort after this many executed statements
    #[arg(long, global = true, value_name = "N")]
    max_steps: Option<u64>,

    /// maximum method call depth
    #[arg(long, global = true, value_name = "N", default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_depth: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// run a file
    Run {
        #[arg(name = "FILE")]
        file: PathBuf,

        /// check syntax only
        #[arg(long)]
        check: bool,
    },
    /// check a file's syntax without running it
    Check {
        #[arg(name = "FILE")]
        file: PathBuf,
    },
}

fn init_tracing(debug: bool, quiet: bool) {
    let default = if debug {
        "juno=debug"
    } else if quiet {
        "juno=error"
    } else {
        "juno=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn read_source(file: &Path) -> Result<String> {
    if file.extension().and_then(|ext| ext.to_str()) != Some("juno") {
        tracing::warn!("{} does not have a .juno extension", file.display());
    }
    fs::read_to_string(file).with_context(|| format!("could not read {}", file.display()))
}

fn check_file(file: &Path) -> Result<()> {
    let source = read_source(file)?;
    juno::check_syntax(&source).with_context(|| format!("{} is not valid", file.display()))?;
    tracing::info!("{}: syntax ok", file.display());
    Ok(())
}

fn run_file(file: &Path, options: Options) -> Result<()> {
    let source = read_source(file)?;
    let mut engine = juno::new_interpreter(options);
    engine.run(&source)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.quiet);

    let options = Options {
        debug: cli.debug,
        step_budget: cli.max_steps,
        max_call_depth: cli.max_depth,
        cancellation: None,
    };

    let result = match cli.command {
        Some(Commands::Run { file, check: true }) | Some(Commands::Check { file }) => {
            check_file(&file)
        }
        Some(Commands::Run { file, check: false }) => run_file(&file, options),
        None => repl::start(options),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

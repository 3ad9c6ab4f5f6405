use std::io::{self, BufRead, Write};

use anyhow::Result;
use juno::Options;

const PROMPT: &str = "juno> ";
const CONTINUATION: &str = "  ... ";

const HELP: &str = r#"Enter Juno statements; an entry runs once its blocks are closed.
Each entry runs in a fresh scope, so declare what you use in the same entry.

  help      show this message
  version   show the interpreter version
  clear     clear the screen
  exit      leave the REPL (also `quit`)

An empty line inside an unfinished entry runs it as is."#;

pub fn start(options: Options) -> Result<()> {
    println!(
        "Juno {} (type `help` for commands)",
        env!("CARGO_PKG_VERSION")
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut entry = String::new();

    loop {
        print!("{}", if entry.is_empty() { PROMPT } else { CONTINUATION });
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => {
                println!();
                return Ok(());
            }
        };

        if entry.is_empty() {
            match line.trim() {
                "" => continue,
                "exit" | "quit" => return Ok(()),
                "help" => {
                    println!("{}", HELP);
                    continue;
                }
                "version" => {
                    println!("juno {}", env!("CARGO_PKG_VERSION"));
                    continue;
                }
                "clear" => {
                    print!("\x1B[2J\x1B[1;1H");
                    continue;
                }
                _ => {}
            }
        }

        entry.push_str(&line);
        entry.push('\n');

        if let Err(error) = juno::check_syntax(&entry) {
            if error.is_incomplete() && !line.trim().is_empty() {
                continue;
            }
        }

        let source = std::mem::take(&mut entry);
        let mut engine = juno::new_interpreter(options.clone());
        if let Err(error) = engine.run(&source) {
            eprintln!("error: {:#}", error);
        }
    }
}

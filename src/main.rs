mod ast;
mod builtins;
mod chain_parser;
mod executor;
mod expander;
mod parser;
mod process;
mod redirect;
mod resolver;
mod status;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use clap::Parser;
use crossterm::tty::IsTty;

use executor::{Outcome, Session};

const PROMPT: &str = "mysh> ";

#[derive(Parser)]
#[command(name = "mysh", version, about = "A small Unix command shell")]
struct Cli {
    /// Script to run line by line; reads standard input when omitted
    script: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let code = match &cli.script {
        Some(path) => match File::open(path) {
            Ok(file) => run(BufReader::new(file), false),
            Err(e) => {
                eprintln!("mysh: {}: {e}", path.display());
                1
            }
        },
        None => {
            let stdin = io::stdin();
            let interactive = stdin.is_tty();
            run(stdin.lock(), interactive)
        }
    };

    std::process::exit(code);
}

/// Read and execute lines until end of input or `exit`.
/// Returns the status the shell should exit with.
fn run(mut input: impl BufRead, interactive: bool) -> i32 {
    let mut stdout = io::stdout();
    let mut session = Session::default();
    let mut line = Vec::new();

    if interactive {
        println!("Welcome to my shell!");
    }

    loop {
        if interactive {
            print!("{PROMPT}");
            if stdout.flush().is_err() {
                break;
            }
        }

        line.clear();
        match input.read_until(b'\n', &mut line) {
            Ok(0) => {
                if interactive {
                    println!("\nExiting my shell.");
                }
                break;
            }
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                let tokens = parser::tokenize(text.trim_end_matches('\n'));

                match chain_parser::build_chain(&tokens, &session) {
                    Ok(Some(chain)) => {
                        if let Outcome::Exit(code) = executor::execute(chain, &mut session) {
                            return code;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("mysh: syntax error: {e}"),
                }
            }
            Err(error) => {
                eprintln!("mysh: error reading input: {error}");
                break;
            }
        }
    }

    session.last_exit_status()
}

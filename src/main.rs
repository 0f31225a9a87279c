//! happiness-api entry point
//!
//! Parses CLI arguments and dispatches to a command via `cli::run`, printing
//! any error to stderr and exiting non-zero. Configuration, logging and
//! server startup all live in the CLI module.

use happiness_api::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

//! CLI module
//!
//! Provides command-line interface for:
//! - serve: Load the collection and start the HTTP server
//! - query: One-shot pass-through query from stdin

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{boot_collection, execute_request, query, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};

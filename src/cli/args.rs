//! CLI argument definitions using clap
//!
//! Commands:
//! - happiness-api serve --config <path> [--port <port>]
//! - happiness-api query --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// World happiness index CRUD service
#[derive(Parser, Debug)]
#[command(name = "happiness-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the collection and start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./happiness.json")]
        config: PathBuf,

        /// Port to listen on, overriding the configuration file
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one find, aggregate or distinct request read from stdin and exit
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./happiness.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

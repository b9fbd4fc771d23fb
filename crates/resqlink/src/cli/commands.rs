//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to listen on, overriding `server.bind_address`
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print the default configuration file path
    Path,

    /// Check a configuration file
    Validate {
        /// File to check (defaults to the standard location)
        file: Option<PathBuf>,
    },
}

//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// calscan - a morning reminder about tomorrow's notable events
#[derive(Debug, Parser)]
#[command(name = "calscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "CALSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output (also mirrors the log to stderr)
    #[arg(long, short = 'v')]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands. Without one, `run` is assumed.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan tomorrow's events and write today's reminder
    Run,

    /// Authenticate with Google and store the token
    Auth {
        /// Discard stored tokens and authorize again
        #[arg(long, short)]
        force: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Print the effective configuration
    Dump,
    /// Check the configuration and the secrets it references
    Validate,
}

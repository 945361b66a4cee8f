use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::{ProblemCommands, SessionCommands};

/// Guided device troubleshooting from the command line
///
/// Stepwise runs users through authored troubleshooting procedures one step
/// at a time. Problems are imported from JSON files; sessions record every
/// action submitted against them. The same operations are available to AI
/// assistants through the MCP server started with `serve`.
#[derive(Parser)]
#[command(version, about, name = "sw")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/stepwise/stepwise.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Path to a JSON engine config file. Defaults to
    /// $XDG_CONFIG_HOME/stepwise/config.json when it exists
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Failures a step may accumulate before the session is aborted;
    /// overrides the config file
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for the Stepwise CLI
///
/// - `problem`: import, inspect and delete troubleshooting procedures
/// - `session`: start sessions and submit actions for their current step
/// - `serve`: start the MCP server for AI assistant integration
#[derive(Subcommand)]
pub enum Commands {
    /// Manage troubleshooting problems
    #[command(alias = "p")]
    Problem {
        #[command(subcommand)]
        command: ProblemCommands,
    },
    /// Run diagnostic sessions
    #[command(alias = "s")]
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Start the MCP server
    Serve,
}

//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use hire_market::CONFIG_ENV;

/// HireHub - a peer-to-peer hiring marketplace with escrowed payments.
#[derive(Parser, Debug, Clone)]
#[command(name = "hirehub")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Marketplace configuration file (JSON).
    #[arg(short, long, env = CONFIG_ENV, global = true)]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table, global = true)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a scripted scenario against an in-memory marketplace.
    ///
    /// Prints the committed event log, the final jobs, and actor balances.
    Run {
        /// Scenario file (JSON).
        scenario: PathBuf,
    },

    /// Rebuild job history from an exported event log.
    Replay {
        /// Event log file (JSON array of event records).
        events: PathBuf,
    },
}

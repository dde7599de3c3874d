//! # hire-cli
//!
//! HireHub command-line interface.
//!
//! Provides commands for:
//! - Running scripted marketplace scenarios (`hirehub run`)
//! - Rebuilding job history from an exported event log (`hirehub replay`)
//!
//! Scenarios run against an in-memory marketplace backed by a simulated
//! bank, so no network or external ledger is involved.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod scenario;

pub use cli::{Cli, Commands, Format};
pub use error::CliError;
pub use output::OutputFormat;
pub use scenario::{RunReport, Scenario, ScenarioRunner};

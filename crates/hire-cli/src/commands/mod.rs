//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`run`] - Scenario execution
//! - [`replay`] - Event log replay

pub mod replay;
pub mod run;

pub use replay::ReplayCommand;
pub use run::RunCommand;

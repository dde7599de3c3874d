//! Scenario execution command.

use std::io::Write;
use std::path::Path;

use hire_market::MarketConfig;
use tracing::info;

use crate::error::CliError;
use crate::output::OutputFormat;
use crate::scenario::{Scenario, ScenarioRunner};

/// Runs a scenario file against a fresh marketplace.
pub struct RunCommand {
    config: MarketConfig,
}

impl RunCommand {
    /// Create a new run command.
    #[must_use]
    pub const fn new(config: MarketConfig) -> Self {
        Self { config }
    }

    /// Execute the scenario at `path` and write the report.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a step
    /// does not behave as scripted.
    pub fn execute<W: Write>(self, writer: &mut W, format: &OutputFormat, path: &Path) -> Result<(), CliError> {
        let raw = std::fs::read_to_string(path)?;
        let scenario = Scenario::from_json(&path.display().to_string(), &raw)?;
        info!(path = %path.display(), steps = scenario.steps.len(), "running scenario");

        let report = ScenarioRunner::new(&scenario, self.config).run(&scenario.steps)?;
        format.write(writer, &report)
    }
}

//! CLI error types.

use hire_escrow::LedgerError;
use hire_market::{ErrorKind, MarketError};
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Scenario or event file could not be parsed.
    #[error("parse error in {path}: {message}")]
    Parse {
        /// Offending file.
        path: String,
        /// Parser message.
        message: String,
    },

    /// Scenario references an actor it never declared.
    #[error("unknown actor: {0}")]
    UnknownActor(String),

    /// A scenario step failed unexpectedly.
    #[error("step {step} ({op}) failed: {source}")]
    Step {
        /// Zero-based step index.
        step: usize,
        /// Operation name.
        op: &'static str,
        /// Underlying error.
        source: MarketError,
    },

    /// A step expected to fail succeeded or failed differently.
    #[error("step {step} ({op}): expected {expected:?} error, got {actual}")]
    UnexpectedOutcome {
        /// Zero-based step index.
        step: usize,
        /// Operation name.
        op: &'static str,
        /// Expected error class.
        expected: ErrorKind,
        /// What actually happened.
        actual: String,
    },

    /// A job deadline lies outside the representable time range.
    #[error("deadline {0} days from now is out of range")]
    InvalidDeadline(i64),

    /// Value could not be attached to a call.
    #[error("funding error: {0}")]
    Funding(#[from] LedgerError),

    /// Marketplace error outside a scenario step.
    #[error(transparent)]
    Market(#[from] MarketError),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use hire_core::JobId;

    #[test]
    fn step_error_names_step_and_cause() {
        let err = CliError::Step {
            step: 3,
            op: "complete_job",
            source: MarketError::JobNotFound(JobId::new(9)),
        };
        assert_eq!(err.to_string(), "step 3 (complete_job) failed: job not found: job-9");
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
    }

    #[test]
    fn market_error_is_transparent() {
        let err = CliError::from(MarketError::Replay("bad".into()));
        assert_eq!(err.to_string(), MarketError::Replay("bad".into()).to_string());
    }
}

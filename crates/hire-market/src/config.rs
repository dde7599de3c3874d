//! Marketplace policy configuration.
//!
//! Policy knobs are read from a JSON document. Missing fields fall back to
//! their defaults, so an empty object is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MarketError, Result};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "HIREHUB_CONFIG";

/// What happens when an address applies for the same job twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationPolicy {
    /// Reject the second application with `AlreadyApplied`.
    #[default]
    Reject,
    /// Accept silently without recording or emitting anything.
    Idempotent,
}

/// Marketplace configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketConfig {
    /// Whether an employer may cancel a job that is waiting for review.
    pub allow_cancel_while_waiting_review: bool,
    /// Handling of repeated applications.
    pub application_policy: ApplicationPolicy,
    /// Prefix for event lines written by the tracing sink.
    pub event_log_prefix: Option<String>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            allow_cancel_while_waiting_review: true,
            application_policy: ApplicationPolicy::Reject,
            event_log_prefix: None,
        }
    }
}

impl MarketConfig {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Config` on malformed JSON or unknown fields.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MarketError::Config(e.to_string()))
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Config` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MarketError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_json(&raw)?;
        debug!(path = %path.display(), ?config, "loaded marketplace config");
        Ok(config)
    }

    /// Load the file named by `HIREHUB_CONFIG`, or fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Config` if the variable is set but the file is
    /// unusable.
    pub fn from_env_or_default() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}

//! Event log replay command.

use std::io::Write;
use std::path::Path;

use hire_market::{EventLog, JobHistory};
use tracing::info;

use crate::error::CliError;
use crate::output::{OutputFormat, ReplayReport};

/// Rebuilds job snapshots from an exported event log.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayCommand;

impl ReplayCommand {
    /// Create a new replay command.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Replay the event log at `path` and write the snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or the log is malformed
    /// or inconsistent.
    pub fn execute<W: Write>(self, writer: &mut W, format: &OutputFormat, path: &Path) -> Result<(), CliError> {
        let raw = std::fs::read_to_string(path)?;
        let log = EventLog::from_json(&raw)?;
        let history = JobHistory::replay(log.records())?;
        info!(path = %path.display(), events = log.len(), jobs = history.len(), "replayed event log");

        let report = ReplayReport {
            events: log.len(),
            jobs: history.jobs().cloned().collect(),
        };
        format.write(writer, &report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use chrono::{DateTime, Utc};
    use hire_core::{Address, Amount, JobId};
    use hire_market::{MarketError, MarketEvent};

    fn exported_log() -> String {
        let mut log = EventLog::new();
        let employer = Address::random();
        log.append(
            MarketEvent::JobCreated {
                job_id: JobId::new(0),
                employer,
                payment: Amount::new(50),
                deadline: DateTime::<Utc>::UNIX_EPOCH,
                description: "Test job".into(),
                skills: "rust".into(),
            },
            DateTime::<Utc>::UNIX_EPOCH,
        );
        log.append(
            MarketEvent::JobCancelled {
                job_id: JobId::new(0),
                employer,
                refunded: Amount::new(50),
            },
            DateTime::<Utc>::UNIX_EPOCH,
        );
        log.to_json().expect("export")
    }

    #[test]
    fn replays_exported_log() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("events.json");
        std::fs::write(&path, exported_log()).expect("write");

        let mut out = Vec::new();
        ReplayCommand::new()
            .execute(&mut out, &OutputFormat::new(Format::Json), &path)
            .expect("replay");

        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(value["events"], 2);
        assert_eq!(value["jobs"][0]["status"], "cancelled");
    }

    #[test]
    fn malformed_log_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("events.json");
        std::fs::write(&path, "[{\"sequence\": 3}]").expect("write");

        let err = ReplayCommand::new()
            .execute(&mut Vec::<u8>::new(), &OutputFormat::default(), &path)
            .unwrap_err();
        assert!(matches!(err, CliError::Market(MarketError::Replay(_))));
    }
}

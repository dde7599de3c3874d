//! Marketplace event stream.
//!
//! Every committed mutation appends exactly one [`EventRecord`] to the
//! [`EventLog`]. Records carry the plaintext that the registries only keep
//! as digests, which makes the log the retrievable, replayable history of
//! the marketplace. Failed operations append nothing.
//!
//! Records are also handed to an [`EventSink`] for delivery elsewhere.

use hire_core::{Address, Amount, JobId, RatingId, Role, Score, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MarketError, Result};

/// A committed marketplace transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    /// A job was posted.
    JobCreated {
        /// New job.
        job_id: JobId,
        /// Poster.
        employer: Address,
        /// Escrowed payment.
        payment: Amount,
        /// Deadline.
        deadline: Timestamp,
        /// Plaintext description.
        description: String,
        /// Plaintext skills.
        skills: String,
    },
    /// An address applied for a job.
    JobApplication {
        /// Target job.
        job_id: JobId,
        /// Applicant.
        applicant: Address,
    },
    /// An applicant was assigned.
    JobAssigned {
        /// Target job.
        job_id: JobId,
        /// Assigned employee.
        employee: Address,
    },
    /// Work was submitted for review.
    JobWaitingReview {
        /// Target job.
        job_id: JobId,
        /// Submitting employee.
        employee: Address,
        /// Plaintext work result.
        work_result: String,
    },
    /// The job was accepted and paid.
    JobCompleted {
        /// Target job.
        job_id: JobId,
        /// Paid employee.
        employee: Address,
        /// Amount released.
        paid: Amount,
    },
    /// The job was cancelled and refunded.
    JobCancelled {
        /// Target job.
        job_id: JobId,
        /// Refunded employer.
        employer: Address,
        /// Amount refunded.
        refunded: Amount,
    },
    /// A cancelled job was reopened.
    JobReopened {
        /// Target job.
        job_id: JobId,
        /// New escrowed payment.
        payment: Amount,
    },
    /// The employer reviewed submitted work.
    ReviewCreated {
        /// Target job.
        job_id: JobId,
        /// Reviewed employee.
        employee: Address,
        /// Score.
        score: Score,
        /// Plaintext comment.
        comment: String,
    },
    /// A job party rated the other.
    RatingCreated {
        /// New rating.
        rating_id: RatingId,
        /// Rated job.
        job_id: JobId,
        /// Who rated.
        rater: Address,
        /// Who was rated.
        ratee: Address,
        /// Ratee's role.
        role: Role,
        /// Score.
        score: Score,
        /// Plaintext comment.
        comment: String,
    },
    /// A resume was stored.
    ResumeCreated {
        /// Resume owner.
        owner: Address,
        /// Resume role.
        role: Role,
        /// Plaintext name.
        name: String,
        /// Plaintext description.
        description: String,
    },
}

impl MarketEvent {
    /// Returns the event type name.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::JobCreated { .. } => "JobCreated",
            Self::JobApplication { .. } => "JobApplication",
            Self::JobAssigned { .. } => "JobAssigned",
            Self::JobWaitingReview { .. } => "JobWaitingReview",
            Self::JobCompleted { .. } => "JobCompleted",
            Self::JobCancelled { .. } => "JobCancelled",
            Self::JobReopened { .. } => "JobReopened",
            Self::ReviewCreated { .. } => "ReviewCreated",
            Self::RatingCreated { .. } => "RatingCreated",
            Self::ResumeCreated { .. } => "ResumeCreated",
        }
    }

    /// The job the event concerns, if any.
    #[must_use]
    pub const fn job_id(&self) -> Option<JobId> {
        match self {
            Self::JobCreated { job_id, .. }
            | Self::JobApplication { job_id, .. }
            | Self::JobAssigned { job_id, .. }
            | Self::JobWaitingReview { job_id, .. }
            | Self::JobCompleted { job_id, .. }
            | Self::JobCancelled { job_id, .. }
            | Self::JobReopened { job_id, .. }
            | Self::ReviewCreated { job_id, .. }
            | Self::RatingCreated { job_id, .. } => Some(*job_id),
            Self::ResumeCreated { .. } => None,
        }
    }
}

/// An event together with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at zero.
    pub sequence: u64,
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Commit time.
    pub timestamp: Timestamp,
    /// The event.
    pub event: MarketEvent,
}

impl EventRecord {
    /// Serializes the record to JSON.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Replay` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| MarketError::Replay(e.to_string()))
    }
}

/// Append-only, ordered event history.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its record.
    pub fn append(&mut self, event: MarketEvent, timestamp: Timestamp) -> &EventRecord {
        let sequence = self.records.len() as u64;
        self.records.push(EventRecord {
            sequence,
            event_id: Uuid::new_v4(),
            timestamp,
            event,
        });
        &self.records[self.records.len() - 1]
    }

    /// All records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `sequence >= from`.
    #[must_use]
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from).map_or(self.records.len(), |s| s.min(self.records.len()));
        &self.records[start..]
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exports the log as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Replay` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.records).map_err(|e| MarketError::Replay(e.to_string()))
    }

    /// Imports a log exported with [`EventLog::to_json`].
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Replay` if the JSON is malformed or the
    /// sequence numbers are not `0, 1, 2, ...`.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<EventRecord> =
            serde_json::from_str(json).map_err(|e| MarketError::Replay(e.to_string()))?;
        for (expected, record) in records.iter().enumerate() {
            if record.sequence != expected as u64 {
                return Err(MarketError::Replay(format!(
                    "expected sequence {expected}, found {}",
                    record.sequence
                )));
            }
        }
        Ok(Self { records })
    }
}

/// Destination for committed events.
///
/// Implement this trait to forward events to an indexer, a file, or a
/// message bus.
pub trait EventSink: Send + Sync {
    /// Deliver a committed record.
    fn publish(&self, record: &EventRecord);
}

/// Sink that writes every record through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingEventSink {
    prefix: Option<String>,
}

impl TracingEventSink {
    /// Creates a new tracing-based sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink whose lines start with `prefix`.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl EventSink for TracingEventSink {
    fn publish(&self, record: &EventRecord) {
        let event_type = record.event.event_type();
        let json = serde_json::to_string(&record.event).unwrap_or_else(|_| "{}".to_string());
        let prefix = self.prefix.as_deref().unwrap_or("MARKET");

        tracing::info!(
            target: "hire_market::events",
            sequence = record.sequence,
            event_id = %record.event_id,
            timestamp = %record.timestamp,
            event_json = %json,
            "[{prefix}] {event_type}"
        );
    }
}

/// A sink that drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn publish(&self, _record: &EventRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingSink {
        count: AtomicUsize,
    }

    impl EventSink for CountingSink {
        fn publish(&self, _record: &EventRecord) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn applied(job: u64) -> MarketEvent {
        MarketEvent::JobApplication {
            job_id: JobId::new(job),
            applicant: Address::from_bytes(&[9; 32]).expect("address"),
        }
    }

    #[test]
    fn sequence_numbers_are_contiguous() {
        let mut log = EventLog::new();
        let now = DateTime::<Utc>::UNIX_EPOCH;
        assert_eq!(log.append(applied(0), now).sequence, 0);
        assert_eq!(log.append(applied(0), now).sequence, 1);
        assert_eq!(log.since(1).len(), 1);
        assert!(log.since(10).is_empty());
    }

    #[test]
    fn json_roundtrip_preserves_records() {
        let mut log = EventLog::new();
        log.append(applied(3), DateTime::<Utc>::UNIX_EPOCH);
        let json = log.to_json().expect("export");
        assert!(json.contains("\"type\": \"job_application\""));

        let back = EventLog::from_json(&json).expect("import");
        assert_eq!(back.records(), log.records());
    }

    #[test]
    fn import_rejects_gaps() {
        let mut log = EventLog::new();
        let now = DateTime::<Utc>::UNIX_EPOCH;
        log.append(applied(0), now);
        log.append(applied(0), now);
        let mut records = log.records().to_vec();
        records.remove(0);
        let json = serde_json::to_string(&records).expect("serialize");

        assert!(matches!(EventLog::from_json(&json), Err(MarketError::Replay(_))));
    }

    #[test]
    fn event_metadata() {
        let event = applied(4);
        assert_eq!(event.event_type(), "JobApplication");
        assert_eq!(event.job_id(), Some(JobId::new(4)));
    }

    #[test]
    fn sinks_receive_records() {
        let counting = CountingSink::default();
        let mut log = EventLog::new();
        let record = log.append(applied(0), DateTime::<Utc>::UNIX_EPOCH).clone();

        counting.publish(&record);
        TracingEventSink::with_prefix("TEST").publish(&record);
        NoopEventSink.publish(&record);
        assert_eq!(counting.count.load(Ordering::SeqCst), 1);

        let shared: Arc<dyn EventSink> = Arc::new(TracingEventSink::new());
        shared.publish(&record);
    }
}

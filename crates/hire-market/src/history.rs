//! Job history reconstructed from the event stream.
//!
//! [`JobHistory::replay`] folds a sequence of [`EventRecord`]s into one
//! [`JobSnapshot`] per job. Every transition is checked against the job
//! lifecycle, so a log that skips or reorders events is rejected instead of
//! producing a plausible but wrong history.

use std::collections::BTreeMap;

use hire_core::{Address, Amount, JobId};
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::events::{EventRecord, MarketEvent};
use crate::job::JobStatus;

/// State of one job as seen through its events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Job identifier.
    pub job_id: JobId,
    /// Poster.
    pub employer: Address,
    /// Currently assigned employee.
    pub employee: Option<Address>,
    /// Current status.
    pub status: JobStatus,
    /// Value currently held in escrow.
    pub escrowed: Amount,
    /// Payment of the current posting.
    pub payment: Amount,
    /// Plaintext description.
    pub description: String,
    /// Plaintext skills.
    pub skills: String,
    /// Applicants in submission order.
    pub applicants: Vec<Address>,
    /// Every submitted work result, oldest first.
    pub work_results: Vec<String>,
    /// Number of reviews left.
    pub review_count: usize,
    /// Number of ratings left.
    pub rating_count: usize,
    /// Every status the job went through, starting with `Open`.
    pub status_trail: Vec<JobStatus>,
}

impl JobSnapshot {
    fn transition(&mut self, to: JobStatus, sequence: u64) -> Result<()> {
        if !self.status.can_transition_to(&to) {
            return Err(MarketError::Replay(format!(
                "event {sequence}: {} cannot move from {} to {to}",
                self.job_id, self.status
            )));
        }
        self.status = to;
        self.status_trail.push(to);
        Ok(())
    }
}

/// Per-job projection of an event stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobHistory {
    jobs: BTreeMap<JobId, JobSnapshot>,
}

impl JobHistory {
    /// Replays `records` in order.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Replay` if sequence numbers are not contiguous
    /// from zero, an event references an unknown job, a job is created twice,
    /// or an event implies an impossible status change.
    pub fn replay(records: &[EventRecord]) -> Result<Self> {
        let mut history = Self::default();
        for (expected, record) in records.iter().enumerate() {
            if record.sequence != expected as u64 {
                return Err(MarketError::Replay(format!(
                    "expected sequence {expected}, found {}",
                    record.sequence
                )));
            }
            history.apply(record)?;
        }
        Ok(history)
    }

    fn snapshot(&mut self, job_id: JobId, sequence: u64) -> Result<&mut JobSnapshot> {
        self.jobs
            .get_mut(&job_id)
            .ok_or_else(|| MarketError::Replay(format!("event {sequence}: unknown {job_id}")))
    }

    fn apply(&mut self, record: &EventRecord) -> Result<()> {
        let seq = record.sequence;
        match &record.event {
            MarketEvent::JobCreated {
                job_id,
                employer,
                payment,
                description,
                skills,
                ..
            } => {
                if self.jobs.contains_key(job_id) {
                    return Err(MarketError::Replay(format!("event {seq}: {job_id} created twice")));
                }
                self.jobs.insert(
                    *job_id,
                    JobSnapshot {
                        job_id: *job_id,
                        employer: *employer,
                        employee: None,
                        status: JobStatus::Open,
                        escrowed: *payment,
                        payment: *payment,
                        description: description.clone(),
                        skills: skills.clone(),
                        applicants: Vec::new(),
                        work_results: Vec::new(),
                        review_count: 0,
                        rating_count: 0,
                        status_trail: vec![JobStatus::Open],
                    },
                );
            }
            MarketEvent::JobApplication { job_id, applicant } => {
                self.snapshot(*job_id, seq)?.applicants.push(*applicant);
            }
            MarketEvent::JobAssigned { job_id, employee } => {
                let job = self.snapshot(*job_id, seq)?;
                job.transition(JobStatus::InProgress, seq)?;
                job.employee = Some(*employee);
            }
            MarketEvent::JobWaitingReview {
                job_id, work_result, ..
            } => {
                let job = self.snapshot(*job_id, seq)?;
                job.transition(JobStatus::WaitingReview, seq)?;
                job.work_results.push(work_result.clone());
            }
            MarketEvent::ReviewCreated { job_id, .. } => {
                let job = self.snapshot(*job_id, seq)?;
                job.transition(JobStatus::InProgress, seq)?;
                job.review_count += 1;
            }
            MarketEvent::JobCompleted { job_id, .. } => {
                let job = self.snapshot(*job_id, seq)?;
                job.transition(JobStatus::Completed, seq)?;
                job.escrowed = Amount::ZERO;
            }
            MarketEvent::JobCancelled { job_id, .. } => {
                let job = self.snapshot(*job_id, seq)?;
                job.transition(JobStatus::Cancelled, seq)?;
                job.escrowed = Amount::ZERO;
            }
            MarketEvent::JobReopened { job_id, payment } => {
                let job = self.snapshot(*job_id, seq)?;
                job.transition(JobStatus::Open, seq)?;
                job.employee = None;
                job.payment = *payment;
                job.escrowed = *payment;
            }
            MarketEvent::RatingCreated { job_id, .. } => {
                let job = self.snapshot(*job_id, seq)?;
                if job.status != JobStatus::Completed {
                    return Err(MarketError::Replay(format!(
                        "event {seq}: rating for {job_id} while {}",
                        job.status
                    )));
                }
                job.rating_count += 1;
            }
            MarketEvent::ResumeCreated { .. } => {}
        }
        Ok(())
    }

    /// Snapshot of one job.
    #[must_use]
    pub fn get(&self, job_id: JobId) -> Option<&JobSnapshot> {
        self.jobs.get(&job_id)
    }

    /// All snapshots in id order.
    pub fn jobs(&self) -> impl Iterator<Item = &JobSnapshot> {
        self.jobs.values()
    }

    /// Number of jobs seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no job was seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Sum of value the stream leaves in escrow.
    #[must_use]
    pub fn total_escrowed(&self) -> Amount {
        self.jobs
            .values()
            .fold(Amount::ZERO, |acc, job| acc.saturating_add(job.escrowed))
    }
}

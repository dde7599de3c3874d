//! Jobs and their lifecycle.
//!
//! A job moves `Open -> InProgress -> WaitingReview -> Completed`. A review
//! sends a `WaitingReview` job back to `InProgress`. An employer may cancel
//! any job that is not finished, and reopen a cancelled one.
//!
//! Money-moving transitions pay out through the [`EscrowLedger`] before the
//! new status is written, so a failed transfer leaves the job untouched.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use hire_core::{Address, Amount, Digest, IdAllocator, JobId, Role, Timestamp};
use hire_escrow::{EscrowLedger, Payout, ValueTransfer};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ApplicationPolicy;
use crate::error::{MarketError, Result};
use crate::gate::IdentityGate;

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepting applications.
    Open,
    /// Assigned and being worked on.
    InProgress,
    /// Work submitted, waiting for the employer.
    WaitingReview,
    /// Paid out. Terminal.
    Completed,
    /// Cancelled and refunded; may be reopened.
    Cancelled,
}

impl JobStatus {
    /// Checks if a transition to the target status is a lifecycle edge.
    #[must_use]
    pub const fn can_transition_to(&self, target: &Self) -> bool {
        use JobStatus::{Cancelled, Completed, InProgress, Open, WaitingReview};

        matches!(
            (self, target),
            (Open, InProgress)
                | (InProgress, WaitingReview)
                | (WaitingReview, InProgress | Completed)
                | (Open | InProgress | WaitingReview, Cancelled)
                | (Cancelled, Open)
        )
    }

    /// Returns true for the terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns the human readable name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in progress",
            Self::WaitingReview => "waiting review",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A posted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier.
    pub id: JobId,
    /// Poster and payer. Never null for an existing job.
    pub employer: Address,
    /// Assigned worker, once assigned.
    pub employee: Option<Address>,
    /// Lifecycle status.
    pub status: JobStatus,
    /// Escrowed payment.
    pub payment: Amount,
    /// Deadline as given by the employer.
    pub deadline: Timestamp,
    /// Digest of the description.
    pub description: Digest,
    /// Digest of the required skills.
    pub skills: Digest,
    /// Digest of the latest submitted work result.
    pub work_result: Option<Digest>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last transition time.
    pub updated_at: Timestamp,
}

impl Job {
    /// The address holding `role` on this job, if any.
    #[must_use]
    pub const fn party(&self, role: Role) -> Option<&Address> {
        match role {
            Role::Employer => Some(&self.employer),
            Role::Employee => self.employee.as_ref(),
        }
    }

    fn set_status(&mut self, status: JobStatus, now: Timestamp) {
        debug_assert!(self.status.can_transition_to(&status));
        self.status = status;
        self.updated_at = now;
    }
}

/// Parameters of a new job.
#[derive(Debug, Clone)]
pub struct NewJob {
    /// Poster and payer.
    pub employer: Address,
    /// Deadline.
    pub deadline: Timestamp,
    /// Digest of the description.
    pub description: Digest,
    /// Digest of the required skills.
    pub skills: Digest,
    /// Value attached to the call.
    pub payment: Amount,
}

/// Result of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The applicant was appended.
    Recorded,
    /// The applicant was already listed and the policy accepts repeats.
    AlreadyRecorded,
}

/// Owner of all jobs and their applicant lists.
#[derive(Debug, Default)]
pub struct JobRegistry {
    ids: IdAllocator<JobId>,
    jobs: BTreeMap<JobId, Job>,
    applications: HashMap<JobId, Vec<Address>>,
    applied: HashSet<(JobId, Address)>,
}

impl JobRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a job and escrow its payment.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::NullAddress` for a null employer, or a transfer
    /// error if the payment cannot be credited.
    pub fn create<T: ValueTransfer>(
        &mut self,
        escrow: &mut EscrowLedger<T>,
        new: NewJob,
        now: Timestamp,
    ) -> Result<JobId> {
        IdentityGate::require_non_null(&new.employer, "employer")?;

        let id = self.ids.allocate();
        escrow.credit(id, new.payment)?;
        self.jobs.insert(
            id,
            Job {
                id,
                employer: new.employer,
                employee: None,
                status: JobStatus::Open,
                payment: new.payment,
                deadline: new.deadline,
                description: new.description,
                skills: new.skills,
                work_result: None,
                created_at: now,
                updated_at: now,
            },
        );
        self.applications.insert(id, Vec::new());

        debug!(job_id = %id, employer = %new.employer, payment = %new.payment, "job created");
        Ok(id)
    }

    /// Look up a job.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::JobNotFound` if the id was never allocated.
    pub fn get(&self, job_id: JobId) -> Result<&Job> {
        self.jobs.get(&job_id).ok_or(MarketError::JobNotFound(job_id))
    }

    fn get_mut(&mut self, job_id: JobId) -> Result<&mut Job> {
        self.jobs
            .get_mut(&job_id)
            .ok_or(MarketError::JobNotFound(job_id))
    }

    /// All jobs in id order.
    pub fn all(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    /// Jobs posted by `employer`.
    pub fn by_employer<'a>(&'a self, employer: &'a Address) -> impl Iterator<Item = &'a Job> {
        self.jobs.values().filter(move |job| &job.employer == employer)
    }

    /// Jobs currently assigned to `employee`.
    pub fn by_employee<'a>(&'a self, employee: &'a Address) -> impl Iterator<Item = &'a Job> {
        self.jobs
            .values()
            .filter(move |job| job.employee.as_ref() == Some(employee))
    }

    /// Number of jobs ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no job was ever created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Apply for an open job.
    ///
    /// # Errors
    ///
    /// `JobNotFound`, `JobNotOpen`, `Unauthorized` for the employer, or
    /// `AlreadyApplied` under [`ApplicationPolicy::Reject`].
    pub fn apply(&mut self, caller: &Address, job_id: JobId, policy: ApplicationPolicy) -> Result<ApplyOutcome> {
        let job = self.get(job_id)?;
        if job.status != JobStatus::Open {
            return Err(MarketError::JobNotOpen {
                job_id,
                status: job.status,
            });
        }
        IdentityGate::require_not_party(caller, &job.employer, "apply for own job")?;
        IdentityGate::require_non_null(caller, "applicant")?;

        if self.applied.contains(&(job_id, *caller)) {
            return match policy {
                ApplicationPolicy::Reject => Err(MarketError::AlreadyApplied {
                    job_id,
                    address: *caller,
                }),
                ApplicationPolicy::Idempotent => Ok(ApplyOutcome::AlreadyRecorded),
            };
        }

        self.applied.insert((job_id, *caller));
        self.applications.entry(job_id).or_default().push(*caller);
        Ok(ApplyOutcome::Recorded)
    }

    /// Applicants in submission order. Employer only.
    ///
    /// # Errors
    ///
    /// `JobNotFound` or `Unauthorized`.
    pub fn applications(&self, caller: &Address, job_id: JobId) -> Result<&[Address]> {
        let job = self.get(job_id)?;
        IdentityGate::require_party(caller, Some(&job.employer), "view job applications")?;
        Ok(self
            .applications
            .get(&job_id)
            .map_or(&[][..], Vec::as_slice))
    }

    /// Assign an applicant and start the job.
    ///
    /// # Errors
    ///
    /// `JobNotFound`, `Unauthorized`, `NullAddress`, `JobNotOpen`, or
    /// `NotAnApplicant`.
    pub fn assign(&mut self, caller: &Address, job_id: JobId, employee: &Address, now: Timestamp) -> Result<()> {
        let job = self.get(job_id)?;
        IdentityGate::require_party(caller, Some(&job.employer), "assign job")?;
        IdentityGate::require_non_null(employee, "employee")?;
        if job.status != JobStatus::Open {
            return Err(MarketError::JobNotOpen {
                job_id,
                status: job.status,
            });
        }
        if !self.applied.contains(&(job_id, *employee)) {
            return Err(MarketError::NotAnApplicant {
                job_id,
                address: *employee,
            });
        }

        let job = self.get_mut(job_id)?;
        job.employee = Some(*employee);
        job.set_status(JobStatus::InProgress, now);
        Ok(())
    }

    /// Submit work for review. Assigned employee only.
    ///
    /// # Errors
    ///
    /// `JobNotFound`, `Unauthorized`, or `JobNotInProgress`.
    pub fn ask_review(&mut self, caller: &Address, job_id: JobId, work_result: Digest, now: Timestamp) -> Result<()> {
        let job = self.get_mut(job_id)?;
        IdentityGate::require_party(caller, job.employee.as_ref(), "submit work for review")?;
        if job.status != JobStatus::InProgress {
            return Err(MarketError::JobNotInProgress {
                job_id,
                status: job.status,
            });
        }

        job.work_result = Some(work_result);
        job.set_status(JobStatus::WaitingReview, now);
        Ok(())
    }

    /// Accept the work and pay the employee.
    ///
    /// # Errors
    ///
    /// `JobNotFound`, `Unauthorized`, `JobNotWaitingReview`, or a transfer
    /// error. On any error the job is unchanged.
    pub fn complete<T: ValueTransfer>(
        &mut self,
        caller: &Address,
        job_id: JobId,
        escrow: &mut EscrowLedger<T>,
        now: Timestamp,
    ) -> Result<Payout> {
        let job = self.get(job_id)?;
        IdentityGate::require_party(caller, Some(&job.employer), "complete job")?;
        if job.status != JobStatus::WaitingReview {
            return Err(MarketError::JobNotWaitingReview {
                job_id,
                status: job.status,
            });
        }
        let employee = job
            .employee
            .ok_or(MarketError::NullAddress("employee"))?;

        let payout = escrow.release(job_id, &employee)?;
        self.get_mut(job_id)?.set_status(JobStatus::Completed, now);
        Ok(payout)
    }

    /// Cancel the job and refund the employer.
    ///
    /// # Errors
    ///
    /// `JobNotFound`, `Unauthorized`, `JobNotCancellable`, or a transfer
    /// error. On any error the job is unchanged.
    pub fn cancel<T: ValueTransfer>(
        &mut self,
        caller: &Address,
        job_id: JobId,
        allow_while_waiting_review: bool,
        escrow: &mut EscrowLedger<T>,
        now: Timestamp,
    ) -> Result<Payout> {
        let job = self.get(job_id)?;
        IdentityGate::require_party(caller, Some(&job.employer), "cancel job")?;
        let cancellable = match job.status {
            JobStatus::Open | JobStatus::InProgress => true,
            JobStatus::WaitingReview => allow_while_waiting_review,
            JobStatus::Completed | JobStatus::Cancelled => false,
        };
        if !cancellable {
            return Err(MarketError::JobNotCancellable {
                job_id,
                status: job.status,
            });
        }
        let employer = job.employer;

        let payout = escrow.refund(job_id, &employer)?;
        self.get_mut(job_id)?.set_status(JobStatus::Cancelled, now);
        Ok(payout)
    }

    /// Reopen a cancelled job with a fresh payment.
    ///
    /// # Errors
    ///
    /// `JobNotFound`, `Unauthorized`, `JobNotCancelled`, or a transfer error.
    pub fn reopen<T: ValueTransfer>(
        &mut self,
        caller: &Address,
        job_id: JobId,
        payment: Amount,
        escrow: &mut EscrowLedger<T>,
        now: Timestamp,
    ) -> Result<()> {
        let job = self.get(job_id)?;
        IdentityGate::require_party(caller, Some(&job.employer), "reopen job")?;
        if job.status != JobStatus::Cancelled {
            return Err(MarketError::JobNotCancelled {
                job_id,
                status: job.status,
            });
        }

        escrow.credit(job_id, payment)?;
        let job = self.get_mut(job_id)?;
        job.employee = None;
        job.work_result = None;
        job.payment = payment;
        job.set_status(JobStatus::Open, now);
        Ok(())
    }

    /// Send a reviewed job back to work. Callers validate first.
    pub(crate) fn resume_after_review(&mut self, job_id: JobId, now: Timestamp) -> Result<()> {
        let job = self.get_mut(job_id)?;
        if job.status != JobStatus::WaitingReview {
            return Err(MarketError::JobNotWaitingReview {
                job_id,
                status: job.status,
            });
        }
        job.set_status(JobStatus::InProgress, now);
        Ok(())
    }
}

//! Employer reviews of submitted work.
//!
//! A review answers a `WaitingReview` job and sends it back to
//! `InProgress`, so one engagement can go through several review cycles.

use std::collections::HashMap;

use hire_core::{Address, Digest, JobId, Score, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::gate::IdentityGate;
use crate::job::{JobRegistry, JobStatus};

/// A review left by the employer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Reviewed job.
    pub job_id: JobId,
    /// Employee whose work was reviewed.
    pub employee: Address,
    /// Score.
    pub score: Score,
    /// Digest of the comment.
    pub comment: Digest,
    /// Creation time.
    pub created_at: Timestamp,
}

/// Owner of all reviews, grouped per job and employee.
#[derive(Debug, Default)]
pub struct ReviewRegistry {
    reviews: HashMap<(JobId, Address), Vec<Review>>,
}

impl ReviewRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Review submitted work and return the job to `InProgress`.
    ///
    /// # Errors
    ///
    /// `JobNotFound`, `Unauthorized`, or `JobNotWaitingReview`.
    pub fn create(
        &mut self,
        jobs: &mut JobRegistry,
        caller: &Address,
        job_id: JobId,
        score: Score,
        comment: Digest,
        now: Timestamp,
    ) -> Result<Review> {
        let job = jobs.get(job_id)?;
        IdentityGate::require_party(caller, Some(&job.employer), "review job")?;
        if job.status != JobStatus::WaitingReview {
            return Err(MarketError::JobNotWaitingReview {
                job_id,
                status: job.status,
            });
        }
        let employee = job.employee.ok_or(MarketError::NullAddress("employee"))?;

        jobs.resume_after_review(job_id, now)?;

        let review = Review {
            job_id,
            employee,
            score,
            comment,
            created_at: now,
        };
        self.reviews
            .entry((job_id, employee))
            .or_default()
            .push(review.clone());
        Ok(review)
    }

    /// Reviews of the assigned employee's work on a job. Employee only.
    ///
    /// # Errors
    ///
    /// `JobNotFound` or `Unauthorized`.
    pub fn reviews(&self, jobs: &JobRegistry, caller: &Address, job_id: JobId) -> Result<&[Review]> {
        let job = jobs.get(job_id)?;
        IdentityGate::require_party(caller, job.employee.as_ref(), "view job reviews")?;
        Ok(self
            .reviews
            .get(&(job_id, *caller))
            .map_or(&[][..], Vec::as_slice))
    }

    /// Total number of reviews ever left.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reviews.values().map(Vec::len).sum()
    }

    /// Whether no review was ever left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Ratings exchanged between the two parties of a completed job.
//!
//! Each party may rate the other once per job. Ratings are immutable and
//! indexed by their natural key `(job, ratee, role)`, so the duplicate check
//! does not depend on how much history has accumulated.

use std::collections::{HashMap, HashSet};

use hire_core::{Address, Digest, IdAllocator, JobId, RatingId, Role, Score, ScoreClass, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::gate::IdentityGate;
use crate::job::{JobRegistry, JobStatus};

/// Score bucket used when querying ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingKind {
    /// Scores above 3.
    Positive,
    /// Scores below 3.
    Negative,
    /// Every score, including the neutral 3.
    #[default]
    Both,
}

impl RatingKind {
    /// Whether a score falls in this bucket.
    #[must_use]
    pub const fn includes(self, score: Score) -> bool {
        match self {
            Self::Both => true,
            Self::Positive => matches!(score.class(), ScoreClass::Positive),
            Self::Negative => matches!(score.class(), ScoreClass::Negative),
        }
    }
}

/// Query filter over a participant's ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RatingFilter {
    /// Score bucket.
    pub kind: RatingKind,
    /// Restrict to ratings received in this role.
    pub role: Option<Role>,
}

impl RatingFilter {
    /// Filter by score bucket across both roles.
    #[must_use]
    pub const fn kind(kind: RatingKind) -> Self {
        Self { kind, role: None }
    }

    /// Filter by role across every score.
    #[must_use]
    pub const fn role(role: Role) -> Self {
        Self {
            kind: RatingKind::Both,
            role: Some(role),
        }
    }

    /// Narrow the filter to one role.
    #[must_use]
    pub const fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Whether a rating passes the filter.
    #[must_use]
    pub fn matches(&self, rating: &Rating) -> bool {
        self.kind.includes(rating.score) && self.role.is_none_or(|role| role == rating.role)
    }
}

/// A rating of one job party by the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    /// Rating identifier.
    pub id: RatingId,
    /// Job the rating is about.
    pub job_id: JobId,
    /// Who gave the rating.
    pub rater: Address,
    /// Who received it.
    pub ratee: Address,
    /// The role the ratee held on the job.
    pub role: Role,
    /// Score.
    pub score: Score,
    /// Digest of the comment.
    pub comment: Digest,
    /// Creation time.
    pub created_at: Timestamp,
}

/// Parameters of a new rating.
#[derive(Debug, Clone)]
pub struct NewRating {
    /// Completed job being rated.
    pub job_id: JobId,
    /// Party being rated.
    pub ratee: Address,
    /// Role the ratee held on the job.
    pub role: Role,
    /// Score.
    pub score: Score,
    /// Digest of the comment.
    pub comment: Digest,
}

/// Owner of all ratings.
#[derive(Debug, Default)]
pub struct RatingRegistry {
    ids: IdAllocator<RatingId>,
    ratings: Vec<Rating>,
    by_ratee: HashMap<Address, Vec<usize>>,
    keys: HashSet<(JobId, Address, Role)>,
}

impl RatingRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rate the counterpart of a completed job.
    ///
    /// The caller must hold the other role on the job, and `ratee` must be
    /// the address that actually held `role`.
    ///
    /// # Errors
    ///
    /// `JobNotFound`, `NullAddress`, `JobNotCompleted`, `Unauthorized`,
    /// `RoleMismatch`, or `DuplicateRating`.
    pub fn create(&mut self, jobs: &JobRegistry, caller: &Address, new: NewRating, now: Timestamp) -> Result<RatingId> {
        let job = jobs.get(new.job_id)?;
        IdentityGate::require_non_null(&new.ratee, "ratee")?;
        if job.status != JobStatus::Completed {
            return Err(MarketError::JobNotCompleted {
                job_id: new.job_id,
                status: job.status,
            });
        }
        IdentityGate::require_party(caller, job.party(new.role.counterpart()), "rate this job party")?;
        if job.party(new.role) != Some(&new.ratee) {
            return Err(MarketError::RoleMismatch {
                job_id: new.job_id,
                ratee: new.ratee,
                role: new.role,
            });
        }

        let key = (new.job_id, new.ratee, new.role);
        if self.keys.contains(&key) {
            return Err(MarketError::DuplicateRating {
                job_id: new.job_id,
                ratee: new.ratee,
                role: new.role,
            });
        }

        let id = self.ids.allocate();
        self.keys.insert(key);
        self.by_ratee
            .entry(new.ratee)
            .or_default()
            .push(self.ratings.len());
        self.ratings.push(Rating {
            id,
            job_id: new.job_id,
            rater: *caller,
            ratee: new.ratee,
            role: new.role,
            score: new.score,
            comment: new.comment,
            created_at: now,
        });
        Ok(id)
    }

    fn received<'a>(&'a self, address: &Address) -> impl Iterator<Item = &'a Rating> + 'a {
        self.by_ratee
            .get(address)
            .into_iter()
            .flatten()
            .map(|&index| &self.ratings[index])
    }

    /// Ratings received by `address` that pass `filter`, oldest first.
    #[must_use]
    pub fn ratings_for(&self, address: &Address, filter: RatingFilter) -> Vec<&Rating> {
        self.received(address).filter(|r| filter.matches(r)).collect()
    }

    /// Number of ratings received by `address` that pass `filter`.
    #[must_use]
    pub fn ratings_count(&self, address: &Address, filter: RatingFilter) -> usize {
        self.received(address).filter(|r| filter.matches(r)).count()
    }

    /// The `index`-th rating received by `address`.
    #[must_use]
    pub fn rating_at(&self, address: &Address, index: usize) -> Option<&Rating> {
        self.received(address).nth(index)
    }

    /// Positive minus negative ratings received by `address`.
    #[must_use]
    pub fn karma(&self, address: &Address) -> i64 {
        self.received(address).fold(0i64, |acc, r| match r.score.class() {
            ScoreClass::Positive => acc.saturating_add(1),
            ScoreClass::Negative => acc.saturating_sub(1),
            ScoreClass::Neutral => acc,
        })
    }

    /// Every rating in the system, in id order.
    #[must_use]
    pub fn all(&self) -> &[Rating] {
        &self.ratings
    }
}

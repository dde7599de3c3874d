//! Error types for hire-market.

use hire_core::{Address, CoreError, JobId, Role};
use hire_escrow::LedgerError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::JobStatus;

/// Result type alias for marketplace operations.
pub type Result<T> = std::result::Result<T, MarketError>;

/// Coarse classification of a [`MarketError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The job (or other record) does not exist.
    NotFound,
    /// The caller is not the party the operation requires.
    Unauthorized,
    /// The job is not in a state that permits the operation.
    InvalidState,
    /// An argument was null, out of range, or otherwise unusable.
    InvalidArgument,
    /// The record being created already exists.
    AlreadyExists,
    /// Escrowed value could not be moved.
    TransferFailure,
    /// A config file or exported event log could not be decoded.
    Malformed,
}

/// Errors that can occur in marketplace operations.
///
/// Every error aborts its operation with no partial mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    /// Job id was never allocated.
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    /// Caller is not allowed to perform the action.
    #[error("{caller} is not authorized to {action}")]
    Unauthorized {
        /// Caller identity.
        caller: Address,
        /// Attempted action.
        action: &'static str,
    },

    /// Job must be `Open`.
    #[error("{job_id} is {status}, expected open")]
    JobNotOpen {
        /// Target job.
        job_id: JobId,
        /// Current status.
        status: JobStatus,
    },

    /// Job must be `InProgress`.
    #[error("{job_id} is {status}, expected in progress")]
    JobNotInProgress {
        /// Target job.
        job_id: JobId,
        /// Current status.
        status: JobStatus,
    },

    /// Job must be `WaitingReview`.
    #[error("{job_id} is {status}, expected waiting review")]
    JobNotWaitingReview {
        /// Target job.
        job_id: JobId,
        /// Current status.
        status: JobStatus,
    },

    /// Job must be `Completed`.
    #[error("{job_id} is {status}, expected completed")]
    JobNotCompleted {
        /// Target job.
        job_id: JobId,
        /// Current status.
        status: JobStatus,
    },

    /// Job must be `Cancelled`.
    #[error("{job_id} is {status}, expected cancelled")]
    JobNotCancelled {
        /// Target job.
        job_id: JobId,
        /// Current status.
        status: JobStatus,
    },

    /// Job cannot be cancelled from its current state.
    #[error("{job_id} cannot be cancelled while {status}")]
    JobNotCancellable {
        /// Target job.
        job_id: JobId,
        /// Current status.
        status: JobStatus,
    },

    /// Null identity where a participant is required.
    #[error("{0} must not be the null address")]
    NullAddress(&'static str),

    /// Assignment target never applied.
    #[error("{address} has not applied for {job_id}")]
    NotAnApplicant {
        /// Target job.
        job_id: JobId,
        /// Address that was not found among applicants.
        address: Address,
    },

    /// Rating target does not hold the claimed role on the job.
    #[error("{ratee} is not the {role} of {job_id}")]
    RoleMismatch {
        /// Target job.
        job_id: JobId,
        /// Address being rated.
        ratee: Address,
        /// Claimed role.
        role: Role,
    },

    /// Invalid primitive value (score, address encoding, ...).
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// Address already applied for the job.
    #[error("{address} already applied for {job_id}")]
    AlreadyApplied {
        /// Target job.
        job_id: JobId,
        /// Applicant.
        address: Address,
    },

    /// A rating already exists for the (job, ratee, role) key.
    #[error("{ratee} was already rated as {role} for {job_id}")]
    DuplicateRating {
        /// Target job.
        job_id: JobId,
        /// Rated address.
        ratee: Address,
        /// Rated role.
        role: Role,
    },

    /// The caller already has a resume for the role.
    #[error("{address} already has a {role} resume")]
    ResumeAlreadyExists {
        /// Resume owner.
        address: Address,
        /// Resume role.
        role: Role,
    },

    /// Escrow could not move value.
    #[error("escrow transfer failed: {0}")]
    Transfer(#[from] LedgerError),

    /// The event stream could not be replayed or (de)serialized.
    #[error("event replay failed: {0}")]
    Replay(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl MarketError {
    /// Create an unauthorized error.
    #[must_use]
    pub const fn unauthorized(caller: Address, action: &'static str) -> Self {
        Self::Unauthorized { caller, action }
    }

    /// Maps the error onto its taxonomy class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::JobNotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::JobNotOpen { .. }
            | Self::JobNotInProgress { .. }
            | Self::JobNotWaitingReview { .. }
            | Self::JobNotCompleted { .. }
            | Self::JobNotCancelled { .. }
            | Self::JobNotCancellable { .. }
            | Self::NotAnApplicant { .. } => ErrorKind::InvalidState,
            Self::NullAddress(_) | Self::RoleMismatch { .. } | Self::Invalid(_) => {
                ErrorKind::InvalidArgument
            }
            Self::Replay(_) | Self::Config(_) => ErrorKind::Malformed,
            Self::AlreadyApplied { .. }
            | Self::DuplicateRating { .. }
            | Self::ResumeAlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::Transfer(_) => ErrorKind::TransferFailure,
        }
    }
}

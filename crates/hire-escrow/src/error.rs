//! Error types for escrow operations.

use hire_core::{Address, Amount, JobId};
use thiserror::Error;

/// Result type alias for escrow operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while holding or moving escrowed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The transfer primitive could not move the value.
    #[error("transfer of {amount} to {to} failed: {reason}")]
    TransferFailed {
        /// Intended recipient.
        to: Address,
        /// Amount that was not moved.
        amount: Amount,
        /// Reason reported by the backend.
        reason: String,
    },

    /// The payer does not hold enough value.
    #[error("insufficient balance for {address}: have {have}, need {need}")]
    InsufficientBalance {
        /// Payer address.
        address: Address,
        /// Current balance.
        have: Amount,
        /// Required balance.
        need: Amount,
    },

    /// No escrow account exists for the job.
    #[error("no escrow held for {0}")]
    UnknownJob(JobId),

    /// Crediting would overflow the job's balance.
    #[error("escrow overflow for {job_id}: {held} + {amount}")]
    Overflow {
        /// Job whose balance would overflow.
        job_id: JobId,
        /// Currently held amount.
        held: Amount,
        /// Amount being credited.
        amount: Amount,
    },
}

impl LedgerError {
    /// Create a transfer failure.
    #[must_use]
    pub fn transfer_failed(to: Address, amount: Amount, reason: impl Into<String>) -> Self {
        Self::TransferFailed {
            to,
            amount,
            reason: reason.into(),
        }
    }
}

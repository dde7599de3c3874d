//! Error types for hire-core.

use thiserror::Error;

/// Errors that can occur when constructing core primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Invalid address encoding or length.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid amount (overflow, underflow, or malformed).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Score outside the accepted 1..=5 range.
    #[error("score must be between {min} and {max}, got {got}")]
    InvalidScore {
        /// Lowest accepted score.
        min: u8,
        /// Highest accepted score.
        max: u8,
        /// The rejected value.
        got: u8,
    },

    /// Malformed hex digest.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// Unknown role name.
    #[error("unknown role: {0}")]
    InvalidRole(String),
}

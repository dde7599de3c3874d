//! # hire-core
//!
//! Primitives shared by the HireHub marketplace crates.
//!
//! This crate provides:
//!
//! - [`Address`] identities with a null sentinel
//! - [`Amount`] values with overflow-safe arithmetic
//! - [`Role`] and [`Score`] used by ratings, reviews and resumes
//! - [`Digest`] and the [`ContentHasher`] primitive for large text fields
//! - [`Clock`] implementations used to timestamp records
//! - [`JobId`]/[`RatingId`] handed out by a never-reusing [`IdAllocator`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod amount;
pub mod clock;
pub mod digest;
pub mod error;
pub mod ids;
pub mod role;

pub use address::Address;
pub use amount::Amount;
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use digest::{Blake3Hasher, ContentHasher, Digest};
pub use error::CoreError;
pub use ids::{IdAllocator, JobId, RatingId};
pub use role::{Role, Score, ScoreClass};

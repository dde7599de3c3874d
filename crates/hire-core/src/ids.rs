//! Opaque record identifiers and their allocator.
//!
//! Identifiers are handed out in increasing order starting at zero and are
//! never reused, even when the record they named stops being interesting.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// Identifier of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

/// Identifier of a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingId(u64);

macro_rules! impl_id {
    ($name:ident, $prefix:literal) => {
        impl $name {
            /// Wraps a raw identifier.
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw identifier.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

impl_id!(JobId, "job");
impl_id!(RatingId, "rating");

/// Monotonic allocator for identifiers of type `T`.
#[derive(Debug, Clone)]
pub struct IdAllocator<T> {
    next: u64,
    _marker: PhantomData<T>,
}

impl<T: From<u64>> IdAllocator<T> {
    /// Creates an allocator whose first identifier is zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: 0,
            _marker: PhantomData,
        }
    }

    /// Returns a fresh identifier.
    pub fn allocate(&mut self) -> T {
        let id = T::from(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Number of identifiers handed out so far.
    #[must_use]
    pub const fn issued(&self) -> u64 {
        self.next
    }
}

impl<T: From<u64>> Default for IdAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

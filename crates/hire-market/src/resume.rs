//! Participant resumes.
//!
//! At most one resume exists per (address, role). There is no update or
//! delete; lookups of a missing resume return the empty sentinel.

use std::collections::HashMap;

use hire_core::{Address, Digest, Role};
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::gate::IdentityGate;

/// Digests of a resume's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resume {
    /// Digest of the name.
    pub name: Digest,
    /// Digest of the description.
    pub description: Digest,
}

impl Resume {
    /// The zero value returned for absent resumes.
    pub const EMPTY: Self = Self {
        name: Digest::ZERO,
        description: Digest::ZERO,
    };

    /// Whether this is the absent-resume sentinel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

/// Owner of all resumes.
#[derive(Debug, Default)]
pub struct ResumeRegistry {
    resumes: HashMap<(Address, Role), Resume>,
}

impl ResumeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the caller's resume for `role`.
    ///
    /// # Errors
    ///
    /// `NullAddress` or `ResumeAlreadyExists`.
    pub fn create(&mut self, caller: &Address, role: Role, resume: Resume) -> Result<()> {
        IdentityGate::require_non_null(caller, "resume owner")?;
        let key = (*caller, role);
        if self.resumes.contains_key(&key) {
            return Err(MarketError::ResumeAlreadyExists {
                address: *caller,
                role,
            });
        }
        self.resumes.insert(key, resume);
        Ok(())
    }

    /// The resume of `address` for `role`, or [`Resume::EMPTY`].
    #[must_use]
    pub fn get(&self, address: &Address, role: Role) -> Resume {
        self.resumes
            .get(&(*address, role))
            .copied()
            .unwrap_or(Resume::EMPTY)
    }

    /// Whether `address` has a resume for `role`.
    #[must_use]
    pub fn contains(&self, address: &Address, role: Role) -> bool {
        self.resumes.contains_key(&(*address, role))
    }
}

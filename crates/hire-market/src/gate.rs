//! Caller authorization.
//!
//! Every mutating operation receives its caller explicitly and checks it
//! here before touching any state.

use hire_core::Address;

use crate::error::{MarketError, Result};

/// Authorization predicates evaluated against an explicit caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityGate;

impl IdentityGate {
    /// Require the caller to be `expected`.
    ///
    /// A null `expected` (e.g. an unassigned employee) never matches.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Unauthorized` otherwise.
    pub fn require_party(caller: &Address, expected: Option<&Address>, action: &'static str) -> Result<()> {
        match expected {
            Some(party) if !party.is_null() && party == caller => Ok(()),
            _ => Err(MarketError::unauthorized(*caller, action)),
        }
    }

    /// Require the caller not to be `excluded`.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Unauthorized` if the caller is `excluded`.
    pub fn require_not_party(caller: &Address, excluded: &Address, action: &'static str) -> Result<()> {
        if caller == excluded {
            return Err(MarketError::unauthorized(*caller, action));
        }
        Ok(())
    }

    /// Require a non-null identity.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::NullAddress` naming `what`.
    pub fn require_non_null(address: &Address, what: &'static str) -> Result<()> {
        if address.is_null() {
            return Err(MarketError::NullAddress(what));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_must_match() {
        let employer = Address::random();
        let stranger = Address::random();

        assert!(IdentityGate::require_party(&employer, Some(&employer), "cancel job").is_ok());
        let err = IdentityGate::require_party(&stranger, Some(&employer), "cancel job").unwrap_err();
        assert_eq!(err, MarketError::unauthorized(stranger, "cancel job"));
    }

    #[test]
    fn missing_or_null_party_never_matches() {
        assert!(IdentityGate::require_party(&Address::NULL, Some(&Address::NULL), "x").is_err());
        assert!(IdentityGate::require_party(&Address::random(), None, "x").is_err());
    }

    #[test]
    fn excluded_party_is_rejected() {
        let employer = Address::random();
        assert!(IdentityGate::require_not_party(&employer, &employer, "apply").is_err());
        assert!(IdentityGate::require_not_party(&Address::random(), &employer, "apply").is_ok());
    }

    #[test]
    fn null_identity_is_invalid_argument() {
        let err = IdentityGate::require_non_null(&Address::NULL, "ratee").unwrap_err();
        assert_eq!(err, MarketError::NullAddress("ratee"));
        assert!(IdentityGate::require_non_null(&Address::random(), "ratee").is_ok());
    }
}

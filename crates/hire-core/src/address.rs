//! Participant addresses.
//!
//! An address is a 32-byte identity rendered as base58. The all-zero
//! address is the null identity: it never belongs to a participant and is
//! used as the "does-not-exist" sentinel for jobs and resumes.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::CoreError;

/// Length of an address in bytes.
pub const ADDRESS_LEN: usize = 32;

/// A 32-byte participant identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The null identity.
    pub const NULL: Self = Self([0; ADDRESS_LEN]);

    /// Generates a random, non-null address from the OS CSPRNG.
    #[must_use]
    pub fn random() -> Self {
        loop {
            let mut bytes = [0u8; ADDRESS_LEN];
            OsRng.fill_bytes(&mut bytes);
            let address = Self(bytes);
            if !address.is_null() {
                return address;
            }
        }
    }

    /// Creates an address from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidAddress` if `bytes` is not 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let array: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| {
            CoreError::InvalidAddress(format!(
                "address must be {ADDRESS_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Creates an address from its base58 encoding.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidAddress` if the string is not valid base58
    /// or does not decode to 32 bytes.
    pub fn from_base58(s: &str) -> Result<Self, CoreError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| CoreError::InvalidAddress(format!("invalid base58: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Returns the base58 encoding.
    #[must_use]
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// Returns true for the null identity.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == [0; ADDRESS_LEN]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

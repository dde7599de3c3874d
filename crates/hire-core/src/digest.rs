//! One-way digests of free-text fields.
//!
//! Records keep only the digest of descriptions, comments and resume text.
//! The plaintext travels in the event stream, and the digest lets anyone
//! holding a copy of the text check that it was not altered.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::CoreError;

/// A 32-byte content digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Digest([u8; 32]);

impl Digest {
    /// The all-zero digest, used as the "no content" sentinel.
    pub const ZERO: Self = Self([0; 32]);

    /// Wraps raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns true for the zero sentinel.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 32]
    }

    /// Returns the lowercase hex encoding.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn parse_hex(s: &str) -> Option<Self> {
        if s.len() != 64 || !s.is_ascii() {
            return None;
        }
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(out))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.to_hex()[..16])
    }
}

impl FromStr for Digest {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s).ok_or_else(|| CoreError::InvalidDigest(s.to_string()))
    }
}

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Content-hashing primitive supplied to the marketplace.
pub trait ContentHasher: Send + Sync {
    /// Hashes a text field.
    fn digest(&self, text: &str) -> Digest;
}

/// Default hasher backed by BLAKE3.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl ContentHasher for Blake3Hasher {
    fn digest(&self, text: &str) -> Digest {
        Digest(*blake3::hash(text.as_bytes()).as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake3_digest_is_deterministic() {
        let hasher = Blake3Hasher;
        assert_eq!(hasher.digest("Test job"), hasher.digest("Test job"));
        assert_ne!(hasher.digest("Test job"), hasher.digest("Test job!"));
    }

    #[test]
    fn empty_text_digest_is_not_zero_sentinel() {
        assert!(!Blake3Hasher.digest("").is_zero());
        assert!(Digest::ZERO.is_zero());
    }

    #[test]
    fn hex_roundtrip() {
        let digest = Blake3Hasher.digest("resume");
        let parsed: Digest = digest.to_hex().parse().expect("parse");
        assert_eq!(parsed, digest);
        assert!("xyz".parse::<Digest>().is_err());
    }
}

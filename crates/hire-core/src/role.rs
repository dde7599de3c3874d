//! Participant roles and review/rating scores.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// The side of a job a participant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The party that posts and pays for a job.
    Employer,
    /// The party that performs a job.
    Employee,
}

impl Role {
    /// Both roles, employer first.
    pub const ALL: [Self; 2] = [Self::Employer, Self::Employee];

    /// Returns the other party's role.
    #[must_use]
    pub const fn counterpart(self) -> Self {
        match self {
            Self::Employer => Self::Employee,
            Self::Employee => Self::Employer,
        }
    }

    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Employer => "employer",
            Self::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "employer" => Ok(Self::Employer),
            "employee" => Ok(Self::Employee),
            _ => Err(CoreError::InvalidRole(s.to_string())),
        }
    }
}

/// Classification of a score.
///
/// The neutral midpoint belongs to neither the positive nor the negative
/// bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreClass {
    /// Score above the midpoint.
    Positive,
    /// Score exactly at the midpoint.
    Neutral,
    /// Score below the midpoint.
    Negative,
}

/// A review or rating score in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    /// Lowest accepted score.
    pub const MIN: u8 = 1;

    /// Highest accepted score.
    pub const MAX: u8 = 5;

    /// Midpoint separating positive from negative scores.
    pub const NEUTRAL: u8 = 3;

    /// Creates a validated score.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidScore` if `value` is outside `1..=5`.
    pub const fn new(value: u8) -> Result<Self, CoreError> {
        if value < Self::MIN || value > Self::MAX {
            return Err(CoreError::InvalidScore {
                min: Self::MIN,
                max: Self::MAX,
                got: value,
            });
        }
        Ok(Self(value))
    }

    /// Returns the raw score.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Classifies the score relative to the neutral midpoint.
    #[must_use]
    pub const fn class(self) -> ScoreClass {
        if self.0 > Self::NEUTRAL {
            ScoreClass::Positive
        } else if self.0 < Self::NEUTRAL {
            ScoreClass::Negative
        } else {
            ScoreClass::Neutral
        }
    }
}

impl TryFrom<u8> for Score {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

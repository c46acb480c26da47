use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MIN_DIGITS: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("caller number is empty")]
    Empty,

    #[error("caller number '{0}' has fewer than 10 digits")]
    TooShort(String),
}

/// A caller's phone number reduced to ASCII digits, keeping a leading `+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        if raw.trim().is_empty() {
            return Err(IdentityError::Empty);
        }

        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.len() < MIN_DIGITS {
            return Err(IdentityError::TooShort(digits));
        }

        // Only a leading `+` survives; one further in is formatting noise.
        let cleaned = if raw.trim_start().starts_with('+') {
            format!("+{digits}")
        } else {
            digits
        };

        Ok(Self(cleaned))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Values coming off the wire go back through normalization.
impl<'de> Deserialize<'de> for CallerIdentity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        CallerIdentity::parse(&raw).map_err(serde::de::Error::custom)
    }
}

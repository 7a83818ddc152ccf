//! Account identifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Ledger account address.
///
/// Stored as lowercase `0x`-prefixed hex so two spellings of the same
/// address compare and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Parse a 20-byte hex address, with or without the `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidAccount`] if the input is not exactly
    /// 40 hex digits.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != 40 {
            return Err(DomainError::InvalidAccount {
                value: value.to_string(),
                reason: "expected 40 hex digits",
            });
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidAccount {
                value: value.to_string(),
                reason: "contains non-hex characters",
            });
        }

        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    /// Get the normalized address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

//! Domain validation errors for core domain types.
//!
//! This module defines errors that occur when domain invariants are violated.
//! These errors are returned by `try_new`/`parse` constructors and by
//! [`OperationIntent::validate`](super::intent::OperationIntent::validate).
//!
//! # Examples
//!
//! ```
//! use forgekeeper::domain::error::DomainError;
//! use forgekeeper::domain::{AssetKind, OperationIntent};
//!
//! let silver = AssetKind::try_new(1).unwrap();
//! let result = OperationIntent::exchange(silver, silver);
//!
//! assert!(matches!(result, Err(DomainError::SelfExchange { .. })));
//! ```

use thiserror::Error;

use super::asset::AssetKind;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Asset kind outside the fixed catalog.
    #[error("asset kind {value} is not in the catalog (expected 0..=6)")]
    UnknownAssetKind {
        /// The rejected raw identifier.
        value: u64,
    },

    /// Acquire targets a derived kind.
    #[error("{kind} cannot be minted; only primary kinds are acquirable")]
    NotAcquirable {
        /// The rejected kind.
        kind: AssetKind,
    },

    /// Transform targets a primary kind.
    #[error("{kind} cannot be forged; only derived kinds have recipes")]
    NotForgeable {
        /// The rejected kind.
        kind: AssetKind,
    },

    /// Exchange names a derived kind on either side.
    #[error("{kind} cannot be traded; only primary kinds are exchangeable")]
    NotExchangeable {
        /// The rejected kind.
        kind: AssetKind,
    },

    /// Exchange gives and wants the same kind.
    #[error("cannot trade {kind} for itself")]
    SelfExchange {
        /// The kind named on both sides.
        kind: AssetKind,
    },

    /// Account address failed to parse.
    #[error("invalid account address '{value}': {reason}")]
    InvalidAccount {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::{AssetKind, FailureReason, Slot};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors reported by a ledger.
///
/// `Clone` so a coalesced read can hand the same failure to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Transient: the ledger could not be reached or answered malformed data.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The ledger refused a write before broadcasting it.
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Errors returned synchronously by the dispatcher.
///
/// Local-precondition variants never reach the ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("invalid intent: {0}")]
    InvalidIntent(#[from] DomainError),

    #[error("{slot} slot is busy with an in-flight transaction")]
    SlotBusy { slot: Slot },

    #[error("mint cooldown active: {remaining_secs}s remaining")]
    CooldownActive { remaining_secs: u64 },

    #[error("insufficient balance of {kind}")]
    InsufficientBalance { kind: AssetKind },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl DispatchError {
    /// True when the same intent may succeed later without changes.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SlotBusy { .. }
                | Self::CooldownActive { .. }
                | Self::Ledger(LedgerError::Unavailable(_))
        )
    }

    /// True for checks evaluated locally, before any ledger write.
    #[must_use]
    pub const fn is_local_precondition(&self) -> bool {
        matches!(
            self,
            Self::InvalidIntent(_)
                | Self::SlotBusy { .. }
                | Self::CooldownActive { .. }
                | Self::InsufficientBalance { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("network mismatch: expected chain {expected}, endpoint reports {actual}")]
    NetworkMismatch { expected: u64, actual: u64 },

    #[error("transaction did not confirm: {0}")]
    TransactionFailed(FailureReason),
}

pub type Result<T> = std::result::Result<T, Error>;

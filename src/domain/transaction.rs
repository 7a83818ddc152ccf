//! Transaction records and their confirmation states.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::AccountId;
use super::intent::{LedgerCall, Slot};

/// Opaque ledger-assigned handle for a broadcast write (a transaction hash
/// on EVM ledgers).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionHandle(String);

impl SubmissionHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Locally generated identifier telling generations of one slot apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Block in which a receipt was included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub number: u64,
    pub hash: Option<String>,
}

/// Outcome recorded by the ledger for a broadcast write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// Ledger receipt for a broadcast write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub status: ReceiptStatus,
    pub block: BlockInfo,
}

impl Receipt {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

/// Why a transaction ended without confirming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The ledger refused the write before broadcasting it.
    Rejected(String),
    /// The write was mined but the chain reverted its state change.
    Reverted,
    /// The ledger could not be reached while submitting or confirming.
    LedgerUnavailable(String),
    /// The caller-supplied confirmation timeout elapsed.
    Timeout,
}

impl FailureReason {
    /// Stable reason code for machine consumers.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "rejected",
            Self::Reverted => "reverted",
            Self::LedgerUnavailable(_) => "ledger_unavailable",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(detail) => write!(f, "rejected: {detail}"),
            Self::Reverted => f.write_str("reverted"),
            Self::LedgerUnavailable(detail) => write!(f, "ledger unavailable: {detail}"),
            Self::Timeout => f.write_str("timed out waiting for receipt"),
        }
    }
}

/// Confirmation state of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TransactionState {
    Idle,
    Submitted,
    Confirming,
    /// `reconciled` is false when the balance or cooldown re-read after the
    /// receipt failed, so cached views may predate this write.
    Confirmed { block: BlockInfo, reconciled: bool },
    Failed { reason: FailureReason },
    Reverted { block: BlockInfo },
    /// Local tracking stopped; the broadcast write may still land.
    Abandoned,
}

impl TransactionState {
    /// True for states that end a transaction.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Confirmed { .. } | Self::Failed { .. } | Self::Reverted { .. } | Self::Abandoned
        )
    }

    /// True while a write occupies the slot.
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(self, Self::Submitted | Self::Confirming)
    }

    /// Failure reason for unsuccessful terminal states.
    ///
    /// A reverted receipt reports [`FailureReason::Reverted`].
    #[must_use]
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Self::Failed { reason } => Some(reason.clone()),
            Self::Reverted { .. } => Some(FailureReason::Reverted),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitted => "submitted",
            Self::Confirming => "confirming",
            Self::Confirmed { .. } => "confirmed",
            Self::Failed { .. } => "failed",
            Self::Reverted { .. } => "reverted",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A ledger write tracked through its confirmation lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub account: AccountId,
    pub call: LedgerCall,
    pub handle: Option<SubmissionHandle>,
    pub state: TransactionState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Start a record in the `Submitted` state.
    #[must_use]
    pub fn submitted(account: AccountId, call: LedgerCall, now: DateTime<Utc>) -> Self {
        Self {
            id: TransactionId::generate(),
            account,
            call,
            handle: None,
            state: TransactionState::Submitted,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub const fn slot(&self) -> Slot {
        self.call.slot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> BlockInfo {
        BlockInfo {
            number: 7,
            hash: None,
        }
    }

    #[test]
    fn terminal_and_in_flight_are_disjoint() {
        let states = [
            TransactionState::Idle,
            TransactionState::Submitted,
            TransactionState::Confirming,
            TransactionState::Confirmed {
                block: block(),
                reconciled: true,
            },
            TransactionState::Failed {
                reason: FailureReason::Timeout,
            },
            TransactionState::Reverted { block: block() },
            TransactionState::Abandoned,
        ];
        for state in &states {
            assert!(!(state.is_terminal() && state.is_in_flight()), "{state}");
        }
        assert!(!TransactionState::Idle.is_terminal());
        assert!(!TransactionState::Idle.is_in_flight());
    }

    #[test]
    fn reverted_reports_reverted_reason() {
        let state = TransactionState::Reverted { block: block() };
        assert_eq!(state.failure_reason(), Some(FailureReason::Reverted));
        assert_eq!(TransactionState::Abandoned.failure_reason(), None);
    }

    #[test]
    fn failure_reason_serializes_with_code() {
        let json = serde_json::to_value(FailureReason::Rejected("insufficient".into())).unwrap();
        assert_eq!(json["code"], "rejected");
        assert_eq!(json["detail"], "insufficient");
        assert_eq!(FailureReason::Timeout.code(), "timeout");
    }
}

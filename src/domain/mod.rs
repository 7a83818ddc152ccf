//! Ledger-agnostic domain types.

pub mod account;
pub mod asset;
pub mod cooldown;
pub mod error;
pub mod intent;
pub mod snapshot;
pub mod transaction;

pub use account::AccountId;
pub use asset::{AssetKind, ASSET_KIND_COUNT};
pub use cooldown::{CooldownState, COOLDOWN_WINDOW_SECS};
pub use error::DomainError;
pub use intent::{LedgerCall, OperationIntent, Slot};
pub use snapshot::BalanceSnapshot;
pub use transaction::{
    BlockInfo, FailureReason, Receipt, ReceiptStatus, SubmissionHandle, TransactionId,
    TransactionRecord, TransactionState,
};

//! Ledger port for balance reads and asset writes.
//!
//! The ledger is the authoritative store of balances and mint timestamps.
//! Writes return as soon as the ledger accepts them; confirmation is a
//! separate [`Ledger::await_receipt`] call so callers can track it
//! independently.

use async_trait::async_trait;

use crate::domain::{AccountId, AssetKind, Receipt, SubmissionHandle};
use crate::error::LedgerError;

/// Port for the external asset ledger.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (`Send + Sync`).
///
/// # Errors
///
/// Reads fail with [`LedgerError::Unavailable`]. Writes fail with
/// [`LedgerError::Rejected`] when the ledger refuses them before broadcast
/// and [`LedgerError::Unavailable`] when it cannot be reached.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Read balances for each `(accounts[i], kinds[i])` pair.
    ///
    /// The result has one entry per pair, in order.
    async fn batch_balance_of(
        &self,
        accounts: &[AccountId],
        kinds: &[AssetKind],
    ) -> Result<Vec<u128>, LedgerError>;

    /// Epoch seconds of the account's last mint, zero if it never minted.
    async fn last_acquire_timestamp(&self, account: &AccountId) -> Result<u64, LedgerError>;

    /// Mint one unit of a primary kind for `account`.
    async fn write_acquire(
        &self,
        account: &AccountId,
        kind: AssetKind,
    ) -> Result<SubmissionHandle, LedgerError>;

    /// Forge one unit of a derived kind for `account`.
    async fn write_transform(
        &self,
        account: &AccountId,
        kind: AssetKind,
    ) -> Result<SubmissionHandle, LedgerError>;

    /// Burn one unit of `give` and mint one unit of `want` for `account`.
    async fn write_exchange(
        &self,
        account: &AccountId,
        want: AssetKind,
        give: AssetKind,
    ) -> Result<SubmissionHandle, LedgerError>;

    /// Wait until the write identified by `handle` is included in a block.
    ///
    /// May wait indefinitely; callers impose their own timeout.
    async fn await_receipt(&self, handle: &SubmissionHandle) -> Result<Receipt, LedgerError>;

    /// Return the ledger name for logging and display.
    fn ledger_name(&self) -> &'static str;
}

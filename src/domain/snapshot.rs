//! Immutable balance snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::account::AccountId;
use super::asset::{AssetKind, ASSET_KIND_COUNT};

/// Balances of every asset kind for one account, as of one ledger read.
///
/// Snapshots are never mutated; a refresh produces a new snapshot with a
/// higher sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSnapshot {
    account: AccountId,
    balances: [u128; ASSET_KIND_COUNT],
    sequence: u64,
    fetched_at: DateTime<Utc>,
}

impl BalanceSnapshot {
    /// Create a snapshot from catalog-ordered balances.
    #[must_use]
    pub const fn new(
        account: AccountId,
        balances: [u128; ASSET_KIND_COUNT],
        sequence: u64,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            account,
            balances,
            sequence,
            fetched_at,
        }
    }

    /// Account these balances belong to.
    #[must_use]
    pub const fn account(&self) -> &AccountId {
        &self.account
    }

    /// Units held of one kind.
    #[must_use]
    pub const fn balance(&self, kind: AssetKind) -> u128 {
        self.balances[kind.index()]
    }

    /// All balances in catalog order.
    #[must_use]
    pub const fn balances(&self) -> &[u128; ASSET_KIND_COUNT] {
        &self.balances
    }

    /// Fetch sequence number; higher means issued later.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    #[must_use]
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// First kind in `kinds` with a zero balance, if any.
    #[must_use]
    pub fn first_missing(&self, kinds: &[AssetKind]) -> Option<AssetKind> {
        kinds.iter().copied().find(|k| self.balance(*k) == 0)
    }

    /// Iterate `(kind, units)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (AssetKind, u128)> + '_ {
        AssetKind::ALL.iter().map(move |k| (*k, self.balance(*k)))
    }
}

//! Mint cooldown window.

use serde::Serialize;

use super::account::AccountId;

/// Fixed interval after a mint during which another mint is refused.
pub const COOLDOWN_WINDOW_SECS: u64 = 60;

/// Cooldown status for one account, derived from a ledger read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CooldownState {
    account: AccountId,
    last_acquire_epoch_secs: u64,
    observed_at_epoch_secs: u64,
}

impl CooldownState {
    /// Build from the ledger's last-mint timestamp and the read time.
    #[must_use]
    pub const fn new(account: AccountId, last_acquire_epoch_secs: u64, observed_at_epoch_secs: u64) -> Self {
        Self {
            account,
            last_acquire_epoch_secs,
            observed_at_epoch_secs,
        }
    }

    #[must_use]
    pub const fn account(&self) -> &AccountId {
        &self.account
    }

    /// Ledger timestamp of the last mint (0 if the account never minted).
    #[must_use]
    pub const fn last_acquire_epoch_secs(&self) -> u64 {
        self.last_acquire_epoch_secs
    }

    #[must_use]
    pub const fn observed_at_epoch_secs(&self) -> u64 {
        self.observed_at_epoch_secs
    }

    #[must_use]
    pub const fn window_secs(&self) -> u64 {
        COOLDOWN_WINDOW_SECS
    }

    /// Whether a mint is refused at `now`.
    ///
    /// A last-mint timestamp ahead of `now` counts as zero elapsed time.
    #[must_use]
    pub const fn is_locked_at(&self, now_epoch_secs: u64) -> bool {
        now_epoch_secs.saturating_sub(self.last_acquire_epoch_secs) < COOLDOWN_WINDOW_SECS
    }

    /// Seconds until the window closes, zero when unlocked.
    #[must_use]
    pub const fn remaining_at(&self, now_epoch_secs: u64) -> u64 {
        let elapsed = now_epoch_secs.saturating_sub(self.last_acquire_epoch_secs);
        COOLDOWN_WINDOW_SECS.saturating_sub(elapsed)
    }

    /// Lock status at the moment of the read.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.is_locked_at(self.observed_at_epoch_secs)
    }
}

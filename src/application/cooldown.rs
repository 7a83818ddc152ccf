//! Mint cooldown gate.
//!
//! Every query re-reads the ledger's last-mint timestamp. The most recent
//! observation is kept only for display.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::domain::{AccountId, CooldownState};
use crate::error::LedgerError;
use crate::port::{Clock, Ledger};

/// Answers whether an account may mint right now.
pub struct CooldownGate {
    ledger: Arc<dyn Ledger>,
    clock: Arc<dyn Clock>,
    observed: RwLock<HashMap<AccountId, CooldownState>>,
}

impl CooldownGate {
    pub fn new(ledger: Arc<dyn Ledger>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger,
            clock,
            observed: RwLock::new(HashMap::new()),
        }
    }

    /// Read the last-mint timestamp and evaluate it against the clock.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] if the timestamp cannot be read.
    pub async fn state(&self, account: &AccountId) -> Result<CooldownState, LedgerError> {
        let last = self.ledger.last_acquire_timestamp(account).await?;
        let now = self.clock.epoch_secs();
        let state = CooldownState::new(account.clone(), last, now);
        debug!(
            account = %account,
            last_acquire = last,
            remaining_secs = state.remaining_at(now),
            "Observed mint cooldown"
        );
        self.observed.write().insert(account.clone(), state.clone());
        Ok(state)
    }

    /// Whether a mint would be refused right now.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] if the timestamp cannot be read.
    pub async fn is_locked(&self, account: &AccountId) -> Result<bool, LedgerError> {
        Ok(self.state(account).await?.is_locked())
    }

    /// Re-read after a confirmed mint so the display reflects the new window.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] if the timestamp cannot be read.
    pub async fn refresh(&self, account: &AccountId) -> Result<CooldownState, LedgerError> {
        self.state(account).await
    }

    /// Last observation, without I/O. Never used to gate a mint.
    #[must_use]
    pub fn last_observed(&self, account: &AccountId) -> Option<CooldownState> {
        self.observed.read().get(account).cloned()
    }
}

//! Wiring for one ledger and the services built on it.

use std::sync::Arc;

use super::cache::BalanceCache;
use super::cooldown::CooldownGate;
use super::dispatch::OperationDispatcher;
use super::orchestration::{OrchestratorConfig, TransactionOrchestrator};
use crate::domain::{AccountId, BalanceSnapshot, CooldownState, OperationIntent, SubmissionHandle};
use crate::error::{DispatchError, LedgerError};
use crate::port::{Clock, Ledger};

/// Shared handles to the balance cache, cooldown gate, orchestrator and
/// dispatcher for one ledger.
#[derive(Clone)]
pub struct Session {
    ledger: Arc<dyn Ledger>,
    balances: Arc<BalanceCache>,
    cooldown: Arc<CooldownGate>,
    orchestrator: TransactionOrchestrator,
    dispatcher: OperationDispatcher,
}

impl Session {
    pub fn new(ledger: Arc<dyn Ledger>, clock: Arc<dyn Clock>, config: OrchestratorConfig) -> Self {
        let balances = Arc::new(BalanceCache::new(Arc::clone(&ledger), Arc::clone(&clock)));
        let cooldown = Arc::new(CooldownGate::new(Arc::clone(&ledger), Arc::clone(&clock)));
        let orchestrator = TransactionOrchestrator::new(
            Arc::clone(&ledger),
            Arc::clone(&balances),
            Arc::clone(&cooldown),
            clock,
            config,
        );
        let dispatcher = OperationDispatcher::new(
            Arc::clone(&balances),
            Arc::clone(&cooldown),
            orchestrator.clone(),
        );
        Self {
            ledger,
            balances,
            cooldown,
            orchestrator,
            dispatcher,
        }
    }

    #[must_use]
    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    #[must_use]
    pub fn balances(&self) -> &Arc<BalanceCache> {
        &self.balances
    }

    #[must_use]
    pub fn cooldown(&self) -> &Arc<CooldownGate> {
        &self.cooldown
    }

    #[must_use]
    pub fn orchestrator(&self) -> &TransactionOrchestrator {
        &self.orchestrator
    }

    #[must_use]
    pub fn dispatcher(&self) -> &OperationDispatcher {
        &self.dispatcher
    }

    /// Shorthand for [`OperationDispatcher::submit`].
    ///
    /// # Errors
    ///
    /// See [`OperationDispatcher::submit`].
    pub async fn submit(
        &self,
        account: &AccountId,
        intent: OperationIntent,
    ) -> Result<SubmissionHandle, DispatchError> {
        self.dispatcher.submit(account, intent).await
    }

    /// Refresh balances and read the cooldown for an account.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] if either read fails.
    pub async fn overview(
        &self,
        account: &AccountId,
    ) -> Result<(Arc<BalanceSnapshot>, CooldownState), LedgerError> {
        let (balances, cooldown) =
            tokio::join!(self.balances.refresh(account), self.cooldown.state(account));
        Ok((balances?, cooldown?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssetKind, Slot, TransactionState};
    use crate::testkit::domain::{account, ledger_at_t0, T0};

    #[tokio::test]
    async fn session_mints_and_reconciles() {
        let (clock, ledger) = ledger_at_t0();
        let ledger = Arc::new(ledger.auto_confirm());
        let session = Session::new(ledger.clone(), clock, OrchestratorConfig::default());
        let alice = account(1);

        session
            .submit(&alice, OperationIntent::acquire(AssetKind::SILVER).unwrap())
            .await
            .unwrap();
        let state = session.orchestrator().wait_settled(&alice, Slot::Acquire).await;

        assert!(matches!(state, TransactionState::Confirmed { .. }));
        assert_eq!(session.balances().current(&alice).unwrap().balance(AssetKind::SILVER), 1);
        let cooldown = session.cooldown().last_observed(&alice).unwrap();
        assert_eq!(cooldown.last_acquire_epoch_secs(), T0 as u64);
        assert!(cooldown.is_locked());
    }

    #[tokio::test]
    async fn overview_reads_both_views() {
        let (clock, ledger) = ledger_at_t0();
        let alice = account(1);
        let ledger = Arc::new(ledger.with_balances(&alice, [1, 2, 3, 0, 0, 0, 1]));
        let session = Session::new(ledger, clock, OrchestratorConfig::default());

        let (snapshot, cooldown) = session.overview(&alice).await.unwrap();
        assert_eq!(snapshot.balance(AssetKind::DANTES_KEY), 1);
        assert!(!cooldown.is_locked());
    }
}

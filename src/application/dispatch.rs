//! Intent validation and dispatch.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. intent well-formedness
//! 2. slot availability
//! 3. mint cooldown (Acquire) or balance of every consumed kind (others)
//!
//! None of these checks reach the ledger's write path. The ledger still has
//! the final word and may refuse a write that passed them.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::cache::BalanceCache;
use super::cooldown::CooldownGate;
use super::orchestration::TransactionOrchestrator;
use crate::domain::{AccountId, OperationIntent, SubmissionHandle};
use crate::error::DispatchError;

/// Validates intents and forwards them to the orchestrator.
#[derive(Clone)]
pub struct OperationDispatcher {
    balances: Arc<BalanceCache>,
    cooldown: Arc<CooldownGate>,
    orchestrator: TransactionOrchestrator,
}

impl OperationDispatcher {
    pub const fn new(
        balances: Arc<BalanceCache>,
        cooldown: Arc<CooldownGate>,
        orchestrator: TransactionOrchestrator,
    ) -> Self {
        Self {
            balances,
            cooldown,
            orchestrator,
        }
    }

    /// Validate `intent` and submit its write.
    ///
    /// # Errors
    ///
    /// Returns the first failed precondition, or [`DispatchError::Ledger`]
    /// if the ledger could not be read or refused the write.
    pub async fn submit(
        &self,
        account: &AccountId,
        intent: OperationIntent,
    ) -> Result<SubmissionHandle, DispatchError> {
        self.preflight(account, &intent).await?;
        self.orchestrator.submit(account, intent.to_call()).await
    }

    /// Like [`submit`](Self::submit) with an explicit confirmation timeout.
    ///
    /// # Errors
    ///
    /// See [`submit`](Self::submit).
    pub async fn submit_with_timeout(
        &self,
        account: &AccountId,
        intent: OperationIntent,
        timeout: Option<Duration>,
    ) -> Result<SubmissionHandle, DispatchError> {
        self.preflight(account, &intent).await?;
        self.orchestrator
            .submit_with_timeout(account, intent.to_call(), timeout)
            .await
    }

    /// Run every local check without submitting.
    ///
    /// # Errors
    ///
    /// Returns the first failed precondition.
    pub async fn preflight(
        &self,
        account: &AccountId,
        intent: &OperationIntent,
    ) -> Result<(), DispatchError> {
        intent.validate()?;

        let slot = intent.slot();
        if !self.orchestrator.is_idle(account, slot) {
            return Err(DispatchError::SlotBusy { slot });
        }

        if let OperationIntent::Acquire { .. } = intent {
            let state = self.cooldown.state(account).await?;
            if state.is_locked() {
                let remaining_secs = state.remaining_at(state.observed_at_epoch_secs());
                debug!(account = %account, remaining_secs, "Mint refused locally");
                return Err(DispatchError::CooldownActive { remaining_secs });
            }
            return Ok(());
        }

        let snapshot = match self.balances.current(account) {
            Some(snapshot) => snapshot,
            None => self.balances.refresh(account).await?,
        };
        if let Some(kind) = snapshot.first_missing(&intent.consumed()) {
            debug!(account = %account, kind = %kind, sequence = snapshot.sequence(), "Insufficient balance");
            return Err(DispatchError::InsufficientBalance { kind });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::orchestration::OrchestratorConfig;
    use crate::domain::{AssetKind, DomainError, Slot};
    use crate::error::LedgerError;
    use crate::testkit::clock::ManualClock;
    use crate::testkit::domain::{account, ledger_at_t0, T0};
    use crate::testkit::ledger::ScriptedLedger;

    fn build(ledger: ScriptedLedger, clock: Arc<ManualClock>) -> (Arc<ScriptedLedger>, OperationDispatcher) {
        let ledger = Arc::new(ledger);
        let balances = Arc::new(BalanceCache::new(ledger.clone(), clock.clone()));
        let cooldown = Arc::new(CooldownGate::new(ledger.clone(), clock.clone()));
        let orchestrator = TransactionOrchestrator::new(
            ledger.clone(),
            Arc::clone(&balances),
            Arc::clone(&cooldown),
            clock,
            OrchestratorConfig::default(),
        );
        (ledger, OperationDispatcher::new(balances, cooldown, orchestrator))
    }

    #[tokio::test]
    async fn self_exchange_is_invalid_before_any_io() {
        let (clock, ledger) = ledger_at_t0();
        let (ledger, dispatcher) = build(ledger, clock);
        let intent = OperationIntent::Exchange {
            want: AssetKind::SILVER,
            give: AssetKind::SILVER,
        };

        let err = dispatcher.submit(&account(1), intent).await.unwrap_err();

        assert_eq!(
            err,
            DispatchError::InvalidIntent(DomainError::SelfExchange { kind: AssetKind::SILVER })
        );
        assert_eq!(ledger.balance_reads() + ledger.timestamp_reads() + ledger.writes(), 0);
    }

    #[tokio::test]
    async fn forge_without_recipe_is_refused_locally() {
        let (clock, ledger) = ledger_at_t0();
        let alice = account(1);
        let (ledger, dispatcher) = build(ledger.with_balances(&alice, [0, 0, 0, 0, 0, 0, 0]), clock);

        let err = dispatcher
            .submit(&alice, OperationIntent::Transform { kind: AssetKind::THORS_HAMMER })
            .await
            .unwrap_err();

        assert_eq!(err, DispatchError::InsufficientBalance { kind: AssetKind::BRONZE });
        assert_eq!(ledger.writes(), 0);
    }

    #[tokio::test]
    async fn missing_second_ingredient_is_named() {
        let (clock, ledger) = ledger_at_t0();
        let alice = account(1);
        let (_, dispatcher) = build(ledger.with_balances(&alice, [1, 0, 1, 0, 0, 0, 0]), clock);

        let err = dispatcher
            .submit(&alice, OperationIntent::Transform { kind: AssetKind::DANTES_KEY })
            .await
            .unwrap_err();

        assert_eq!(err, DispatchError::InsufficientBalance { kind: AssetKind::SILVER });
    }

    #[tokio::test]
    async fn mint_during_cooldown_never_writes() {
        let (clock, ledger) = ledger_at_t0();
        let alice = account(1);
        let ledger = ledger.with_last_acquire(&alice, (T0 - 30) as u64);
        let (ledger, dispatcher) = build(ledger, clock);

        let err = dispatcher
            .submit(&alice, OperationIntent::Acquire { kind: AssetKind::BRONZE })
            .await
            .unwrap_err();

        assert_eq!(err, DispatchError::CooldownActive { remaining_secs: 30 });
        assert_eq!(ledger.writes(), 0);
    }

    #[tokio::test]
    async fn mint_after_window_is_submitted() {
        let (clock, ledger) = ledger_at_t0();
        let alice = account(1);
        let ledger = ledger.with_last_acquire(&alice, (T0 - 61) as u64);
        let (ledger, dispatcher) = build(ledger, clock);

        dispatcher
            .submit(&alice, OperationIntent::Acquire { kind: AssetKind::BRONZE })
            .await
            .unwrap();

        assert_eq!(ledger.writes(), 1);
    }

    #[tokio::test]
    async fn busy_slot_is_checked_before_cooldown() {
        let (clock, ledger) = ledger_at_t0();
        let alice = account(1);
        let (ledger, dispatcher) = build(ledger, clock);

        dispatcher
            .submit(&alice, OperationIntent::Acquire { kind: AssetKind::GOLD })
            .await
            .unwrap();
        let reads = ledger.timestamp_reads();

        let err = dispatcher
            .submit(&alice, OperationIntent::Acquire { kind: AssetKind::SILVER })
            .await
            .unwrap_err();

        assert_eq!(err, DispatchError::SlotBusy { slot: Slot::Acquire });
        assert_eq!(ledger.timestamp_reads(), reads);
    }

    #[tokio::test]
    async fn first_balance_check_refreshes_once() {
        let (clock, ledger) = ledger_at_t0();
        let alice = account(1);
        let (ledger, dispatcher) = build(ledger.with_balances(&alice, [0, 2, 0, 0, 0, 0, 0]), clock);
        let trade = OperationIntent::Exchange {
            want: AssetKind::BRONZE,
            give: AssetKind::SILVER,
        };

        dispatcher.preflight(&alice, &trade).await.unwrap();
        dispatcher.preflight(&alice, &trade).await.unwrap();

        assert_eq!(ledger.balance_reads(), 1);
    }

    #[tokio::test]
    async fn unreadable_cooldown_blocks_mint() {
        let (clock, ledger) = ledger_at_t0();
        ledger.fail_reads(Some(LedgerError::Unavailable("503".into())));
        let (ledger, dispatcher) = build(ledger, clock);

        let err = dispatcher
            .submit(&account(1), OperationIntent::Acquire { kind: AssetKind::GOLD })
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(ledger.writes(), 0);
    }
}

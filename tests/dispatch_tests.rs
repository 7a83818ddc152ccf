//! Local precondition checks seen through a wired session.

use std::sync::Arc;

use forgekeeper::application::orchestration::OrchestratorConfig;
use forgekeeper::application::session::Session;
use forgekeeper::domain::{AssetKind, DomainError, OperationIntent, Slot};
use forgekeeper::error::{DispatchError, LedgerError};
use forgekeeper::testkit::clock::ManualClock;
use forgekeeper::testkit::domain::{account, ledger_at_t0, T0};
use forgekeeper::testkit::ledger::ScriptedLedger;

fn session_with(ledger: ScriptedLedger, clock: Arc<ManualClock>) -> (Arc<ScriptedLedger>, Session) {
    let ledger = Arc::new(ledger);
    let session = Session::new(ledger.clone(), clock, OrchestratorConfig::default());
    (ledger, session)
}

#[tokio::test]
async fn cooldown_window_opens_after_sixty_seconds() {
    let alice = account(1);
    let (clock, ledger) = ledger_at_t0();
    let ledger = ledger.with_last_acquire(&alice, (T0 - 30) as u64);
    let (ledger, session) = session_with(ledger, clock.clone());

    assert!(session.cooldown().is_locked(&alice).await.unwrap());
    let intent = OperationIntent::acquire(AssetKind::GOLD).unwrap();
    assert_eq!(
        session.submit(&alice, intent).await,
        Err(DispatchError::CooldownActive { remaining_secs: 30 })
    );

    clock.set_epoch_secs(T0 + 31);
    assert!(!session.cooldown().is_locked(&alice).await.unwrap());
    assert!(session.submit(&alice, intent).await.is_ok());
    assert_eq!(ledger.writes(), 1);
}

#[tokio::test]
async fn forge_without_recipe_never_reaches_ledger() {
    let alice = account(1);
    let (clock, ledger) = ledger_at_t0();
    let ledger = ledger.with_balances(&alice, [0, 3, 0, 0, 0, 0, 0]);
    let (ledger, session) = session_with(ledger, clock);

    let intent = OperationIntent::transform(AssetKind::THORS_HAMMER).unwrap();
    assert_eq!(
        session.submit(&alice, intent).await,
        Err(DispatchError::InsufficientBalance {
            kind: AssetKind::BRONZE
        })
    );
    assert_eq!(ledger.writes(), 0);
    assert!(session.orchestrator().is_idle(&alice, Slot::Transform));
}

#[test]
fn self_exchange_is_invalid() {
    let silver = AssetKind::SILVER;
    assert_eq!(
        OperationIntent::exchange(silver, silver),
        Err(DomainError::SelfExchange { kind: silver })
    );
}

#[tokio::test]
async fn malformed_intent_is_rejected_without_io() {
    let alice = account(1);
    let (clock, ledger) = ledger_at_t0();
    let (ledger, session) = session_with(ledger, clock);

    let intent = OperationIntent::Exchange {
        want: AssetKind::SILVER,
        give: AssetKind::SILVER,
    };
    let result = session.submit(&alice, intent).await;
    assert!(matches!(result, Err(DispatchError::InvalidIntent(_))));
    assert_eq!(ledger.balance_reads(), 0);
    assert_eq!(ledger.timestamp_reads(), 0);
    assert_eq!(ledger.writes(), 0);
}

#[tokio::test]
async fn unreadable_ledger_blocks_trade_as_retryable() {
    let alice = account(1);
    let (clock, ledger) = ledger_at_t0();
    let (ledger, session) = session_with(ledger, clock);
    ledger.fail_reads(Some(LedgerError::Unavailable("connection refused".into())));

    let intent = OperationIntent::exchange(AssetKind::GOLD, AssetKind::BRONZE).unwrap();
    let err = session.submit(&alice, intent).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(ledger.writes(), 0);
}

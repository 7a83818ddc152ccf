//! End-to-end orchestration over the scripted ledger.

use std::sync::Arc;
use std::time::Duration;

use forgekeeper::application::orchestration::{OrchestratorConfig, SlotEvent};
use forgekeeper::application::session::Session;
use forgekeeper::domain::{
    AssetKind, FailureReason, OperationIntent, Slot, TransactionState,
};
use forgekeeper::error::{DispatchError, LedgerError};
use forgekeeper::testkit::clock::ManualClock;
use forgekeeper::testkit::domain::{account, ledger_at_t0, T0};
use forgekeeper::testkit::ledger::ScriptedLedger;
use tokio::sync::broadcast;

fn session(
    configure: impl FnOnce(ScriptedLedger) -> ScriptedLedger,
) -> (Arc<ManualClock>, Arc<ScriptedLedger>, Session) {
    let (clock, ledger) = ledger_at_t0();
    let ledger = Arc::new(configure(ledger));
    let session = Session::new(ledger.clone(), clock.clone(), OrchestratorConfig::default());
    (clock, ledger, session)
}

async fn settled(session: &Session, n: u8, slot: Slot) -> TransactionState {
    tokio::time::timeout(
        Duration::from_secs(5),
        session.orchestrator().wait_settled(&account(n), slot),
    )
    .await
    .expect("slot settles")
}

fn drain(rx: &mut broadcast::Receiver<SlotEvent>) -> Vec<SlotEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn transform_and_exchange_confirm_in_reverse_order() {
    let alice = account(1);
    let (_clock, ledger, session) = session(|l| l.with_balances(&alice, [2, 1, 1, 0, 0, 0, 0]));
    let before = session.balances().refresh(&alice).await.unwrap();

    let forge = OperationIntent::transform(AssetKind::THORS_HAMMER).unwrap();
    let trade = OperationIntent::exchange(AssetKind::GOLD, AssetKind::BRONZE).unwrap();
    let forge_handle = session.submit(&alice, forge).await.unwrap();
    let trade_handle = session.submit(&alice, trade).await.unwrap();

    assert_eq!(
        session.orchestrator().state(&alice, Slot::Transform),
        TransactionState::Confirming
    );
    assert_eq!(
        session.orchestrator().state(&alice, Slot::Exchange),
        TransactionState::Confirming
    );
    assert_eq!(session.orchestrator().in_flight(&alice).len(), 2);

    ledger.confirm(&trade_handle);
    assert!(matches!(
        settled(&session, 1, Slot::Exchange).await,
        TransactionState::Confirmed { .. }
    ));
    ledger.confirm(&forge_handle);
    assert!(matches!(
        settled(&session, 1, Slot::Transform).await,
        TransactionState::Confirmed { .. }
    ));

    let after = session.balances().current(&alice).unwrap();
    assert!(after.sequence() > before.sequence());
    // bronze: 2 - 1 (hammer) - 1 (trade); silver consumed; gold 1 + 1
    assert_eq!(after.balance(AssetKind::BRONZE), 0);
    assert_eq!(after.balance(AssetKind::SILVER), 0);
    assert_eq!(after.balance(AssetKind::GOLD), 2);
    assert_eq!(after.balance(AssetKind::THORS_HAMMER), 1);
    assert_eq!(after.balances(), &ledger.balances_of(&alice));
}

#[tokio::test]
async fn two_accounts_forge_concurrently() {
    let alice = account(1);
    let bob = account(2);
    let (_clock, ledger, session) = session(|l| {
        l.with_balances(&alice, [1, 1, 0, 0, 0, 0, 0])
            .with_balances(&bob, [0, 1, 1, 0, 0, 0, 0])
    });

    let hammer = OperationIntent::transform(AssetKind::THORS_HAMMER).unwrap();
    let shield = OperationIntent::transform(AssetKind::SHIELD).unwrap();
    let (a, b) = tokio::join!(session.submit(&alice, hammer), session.submit(&bob, shield));
    let (a, b) = (a.unwrap(), b.unwrap());

    ledger.confirm(&b);
    ledger.confirm(&a);
    let (sa, sb) = tokio::join!(
        settled(&session, 1, Slot::Transform),
        settled(&session, 2, Slot::Transform)
    );
    assert!(matches!(sa, TransactionState::Confirmed { .. }));
    assert!(matches!(sb, TransactionState::Confirmed { .. }));

    let alice_now = session.balances().current(&alice).unwrap();
    let bob_now = session.balances().current(&bob).unwrap();
    assert_eq!(alice_now.balance(AssetKind::THORS_HAMMER), 1);
    assert_eq!(bob_now.balance(AssetKind::SHIELD), 1);
    assert_eq!(bob_now.balance(AssetKind::THORS_HAMMER), 0);
}

#[tokio::test]
async fn mint_publishes_full_lifecycle_and_locks_cooldown() {
    let alice = account(1);
    let (clock, ledger, session) = session(|l| l);
    let mut rx = session.orchestrator().subscribe();

    let intent = OperationIntent::acquire(AssetKind::SILVER).unwrap();
    let handle = session.submit(&alice, intent).await.unwrap();
    ledger.confirm(&handle);
    settled(&session, 1, Slot::Acquire).await;

    let state = session.cooldown().last_observed(&alice).unwrap();
    assert_eq!(state.last_acquire_epoch_secs(), T0 as u64);
    assert!(state.is_locked());

    assert!(session.orchestrator().acknowledge(&alice, Slot::Acquire).is_some());
    let names: Vec<_> = drain(&mut rx).iter().map(|e| e.state.name()).collect();
    assert_eq!(names, ["submitted", "confirming", "confirmed", "idle"]);

    let again = session.submit(&alice, intent).await;
    assert!(matches!(again, Err(DispatchError::CooldownActive { remaining_secs: 60 })));

    clock.advance_secs(60);
    assert!(session.submit(&alice, intent).await.is_ok());
    assert_eq!(ledger.writes(), 2);
}

#[tokio::test]
async fn rejected_write_is_returned_and_published() {
    let alice = account(1);
    let (_clock, ledger, session) = session(|l| l);
    let mut rx = session.orchestrator().subscribe();
    ledger.fail_next_write(LedgerError::Rejected("nonce too low".into()));

    let intent = OperationIntent::acquire(AssetKind::BRONZE).unwrap();
    let result = session.submit(&alice, intent).await;
    assert!(matches!(result, Err(DispatchError::Ledger(LedgerError::Rejected(_)))));

    let events = drain(&mut rx);
    let last = events.last().unwrap();
    assert_eq!(
        last.state.failure_reason(),
        Some(FailureReason::Rejected("nonce too low".into()))
    );

    // The failed record holds the slot until it is acknowledged.
    let again = session.submit(&alice, intent).await;
    assert!(matches!(again, Err(DispatchError::SlotBusy { slot: Slot::Acquire })));
    let record = session.orchestrator().acknowledge(&alice, Slot::Acquire).unwrap();
    assert!(matches!(record.state, TransactionState::Failed { .. }));
    assert!(session.orchestrator().is_idle(&alice, Slot::Acquire));
    assert!(session.submit(&alice, intent).await.is_ok());
}

#[tokio::test]
async fn reverted_forge_keeps_balances() {
    let alice = account(1);
    let (_clock, ledger, session) = session(|l| l.with_balances(&alice, [1, 1, 1, 0, 0, 0, 0]));
    let before = session.balances().refresh(&alice).await.unwrap();

    let intent = OperationIntent::transform(AssetKind::DANTES_KEY).unwrap();
    let handle = session.submit(&alice, intent).await.unwrap();
    ledger.revert(&handle);

    assert!(matches!(
        settled(&session, 1, Slot::Transform).await,
        TransactionState::Reverted { .. }
    ));
    let after = session.balances().current(&alice).unwrap();
    assert!(Arc::ptr_eq(&before, &after));

    let retry = session.submit(&alice, intent).await;
    assert!(matches!(retry, Err(DispatchError::SlotBusy { slot: Slot::Transform })));
    assert_eq!(ledger.writes(), 1);
    assert!(session.orchestrator().acknowledge(&alice, Slot::Transform).is_some());
    assert!(session.orchestrator().acknowledge(&alice, Slot::Transform).is_none());
}

#[tokio::test]
async fn cancelled_write_is_reconciled_by_next_refresh() {
    let alice = account(1);
    let (_clock, ledger, session) = session(|l| l.with_balances(&alice, [1, 0, 0, 0, 0, 0, 0]));
    session.balances().refresh(&alice).await.unwrap();

    let intent = OperationIntent::exchange(AssetKind::GOLD, AssetKind::BRONZE).unwrap();
    let handle = session.submit(&alice, intent).await.unwrap();
    assert!(session.orchestrator().cancel(&alice, Slot::Exchange));
    assert_eq!(
        session.orchestrator().state(&alice, Slot::Exchange),
        TransactionState::Abandoned
    );

    // The write still lands on the ledger.
    ledger.confirm(&handle);
    tokio::task::yield_now().await;
    assert_eq!(
        session.orchestrator().state(&alice, Slot::Exchange),
        TransactionState::Abandoned
    );
    let snapshot = session.balances().refresh(&alice).await.unwrap();
    assert_eq!(snapshot.balance(AssetKind::GOLD), 1);
    assert_eq!(snapshot.balance(AssetKind::BRONZE), 0);
}

#[tokio::test]
async fn concurrent_submits_on_one_slot_admit_one() {
    let alice = account(1);
    let (_clock, ledger, session) = session(|l| l.with_balances(&alice, [0, 8, 8, 0, 0, 0, 0]));
    session.balances().refresh(&alice).await.unwrap();

    let intent = OperationIntent::transform(AssetKind::SHIELD).unwrap();
    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let session = session.clone();
            let alice = alice.clone();
            tokio::spawn(async move { session.submit(&alice, intent).await })
        })
        .collect();

    let mut admitted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(e) => assert!(matches!(e, DispatchError::SlotBusy { slot: Slot::Transform })),
        }
    }
    assert_eq!(admitted, 1);
    assert_eq!(ledger.writes(), 1);
}

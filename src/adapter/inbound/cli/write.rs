//! Handlers for the write commands: `mint`, `forge`, `trade`.
//!
//! Each command runs the local preconditions, submits one write and follows
//! its slot until it settles. Ctrl-C while confirming stops tracking; the
//! write itself may still land. Once a receipt is in, the balance re-read
//! runs to completion unless Ctrl-C is pressed a second time.

use std::time::Duration;

use serde_json::json;
use tokio::sync::broadcast;
use tracing::warn;

use crate::adapter::inbound::cli::inspect::{open, print_balances, resolve_account};
use crate::adapter::inbound::cli::output;
use crate::application::orchestration::{SlotEvent, TransactionOrchestrator};
use crate::application::session::Session;
use crate::domain::{AccountId, FailureReason, OperationIntent, Slot, TransactionState};
use crate::error::{ConfigError, Error, Result};
use crate::infrastructure::config::settings::Config;

/// Execute a write command.
///
/// `timeout_secs` overrides `[confirmation].timeout_secs` for this write.
pub async fn execute(config: &Config, intent: OperationIntent, timeout_secs: Option<u64>) -> Result<()> {
    if timeout_secs == Some(0) {
        return Err(ConfigError::InvalidValue {
            field: "timeout",
            reason: "must be greater than 0".to_string(),
        }
        .into());
    }

    let (ledger, session) = open(config)?;
    let account = resolve_account(&ledger, None)?;

    let pb = output::spinner("Checking network...");
    if let Err(e) = ledger.verify_network().await {
        output::spinner_fail(&pb, "Network check failed");
        return Err(e);
    }
    pb.finish_and_clear();

    let timeout = timeout_secs
        .map(Duration::from_secs)
        .or_else(|| config.confirmation.timeout());
    let slot = intent.slot();

    // Subscribe before submitting so no transition is missed.
    let events = session.orchestrator().subscribe();

    let pb = output::spinner(&format!("Submitting {intent}..."));
    let handle = match session
        .dispatcher()
        .submit_with_timeout(&account, intent, timeout)
        .await
    {
        Ok(handle) => handle,
        Err(e) => {
            output::spinner_fail(&pb, &format!("{intent} not submitted"));
            return Err(e.into());
        }
    };
    pb.set_message(format!("Confirming {}...", output::muted(&handle)));

    let state = follow(&session, &account, slot, events).await;
    session.orchestrator().acknowledge(&account, slot);

    match state {
        TransactionState::Confirmed { block, reconciled } => {
            output::spinner_success(&pb, &format!("{intent} confirmed in block {}", block.number));
            if output::is_json() {
                output::json_output(json!({
                    "command": command_name(slot),
                    "account": account,
                    "handle": handle,
                    "block": block,
                    "reconciled": reconciled,
                }));
            }
            if !reconciled {
                output::warning("Balances could not be re-read after confirmation");
                output::hint("run `forgekeeper balances` to see the result");
            } else if let Some(snapshot) = session.balances().current(&account) {
                print_balances(&snapshot);
            }
            Ok(())
        }
        TransactionState::Reverted { block } => {
            output::spinner_fail(&pb, &format!("{intent} reverted in block {}", block.number));
            Err(Error::TransactionFailed(FailureReason::Reverted))
        }
        TransactionState::Failed { reason } => {
            output::spinner_fail(&pb, &format!("{intent} failed"));
            Err(Error::TransactionFailed(reason))
        }
        TransactionState::Abandoned => {
            output::spinner_fail(&pb, "Stopped waiting");
            output::warning(&format!(
                "{handle} may still be confirmed; check balances later"
            ));
            Ok(())
        }
        TransactionState::Idle | TransactionState::Submitted | TransactionState::Confirming => {
            output::spinner_fail(&pb, "Lost track of the write");
            Err(Error::TransactionFailed(FailureReason::LedgerUnavailable(
                "slot event stream closed".to_string(),
            )))
        }
    }
}

const fn command_name(slot: Slot) -> &'static str {
    match slot {
        Slot::Acquire => "mint",
        Slot::Transform => "forge",
        Slot::Exchange => "trade",
    }
}

/// What a Ctrl-C did to the followed slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    /// Tracking stopped and the slot is `Abandoned`.
    Cancelled,
    /// The receipt is in and its outcome is being recorded.
    Recording,
    /// Ctrl-C pressed again while recording; stop waiting.
    StopWaiting,
}

fn interrupt(
    orchestrator: &TransactionOrchestrator,
    account: &AccountId,
    slot: Slot,
    repeated: bool,
) -> Interrupt {
    if orchestrator.cancel(account, slot) {
        Interrupt::Cancelled
    } else if repeated {
        Interrupt::StopWaiting
    } else {
        Interrupt::Recording
    }
}

/// Report slot events until the slot settles, cancelling on Ctrl-C.
///
/// Returns `Abandoned` if the caller stops waiting while the outcome is
/// still being recorded.
async fn follow(
    session: &Session,
    account: &AccountId,
    slot: Slot,
    mut events: broadcast::Receiver<SlotEvent>,
) -> TransactionState {
    let orchestrator = session.orchestrator();
    let mut interrupted = false;

    loop {
        let state = orchestrator.state(account, slot);
        if !state.is_in_flight() {
            return state;
        }

        tokio::select! {
            received = events.recv() => match received {
                Ok(event) if event.is_for(account, slot) => {
                    output::slot_event(&event);
                }
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return orchestrator.state(account, slot),
            },
            _ = tokio::signal::ctrl_c() => {
                match interrupt(orchestrator, account, slot, interrupted) {
                    Interrupt::Cancelled => {}
                    Interrupt::Recording => {
                        output::note("receipt received, refreshing balances; press Ctrl-C again to stop waiting");
                    }
                    Interrupt::StopWaiting => {
                        warn!(account = %account, slot = %slot, "Stopped waiting for the outcome to be recorded");
                        return TransactionState::Abandoned;
                    }
                }
                interrupted = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::orchestration::OrchestratorConfig;
    use crate::domain::AssetKind;
    use crate::testkit::domain::{account, ledger_at_t0};
    use crate::testkit::ledger::ScriptedLedger;

    fn session(balances: [u128; 7]) -> (Arc<ScriptedLedger>, Session) {
        let (clock, ledger) = ledger_at_t0();
        let ledger = Arc::new(ledger.with_balances(&account(1), balances));
        let session = Session::new(ledger.clone(), clock, OrchestratorConfig::default());
        (ledger, session)
    }

    #[tokio::test]
    async fn ctrl_c_while_confirming_cancels() {
        let (_ledger, session) = session([1, 0, 0, 0, 0, 0, 0]);
        let alice = account(1);
        let intent = OperationIntent::exchange(AssetKind::GOLD, AssetKind::BRONZE).unwrap();
        session.submit(&alice, intent).await.unwrap();

        let orchestrator = session.orchestrator();
        assert_eq!(interrupt(orchestrator, &alice, Slot::Exchange, false), Interrupt::Cancelled);
        assert_eq!(orchestrator.state(&alice, Slot::Exchange), TransactionState::Abandoned);
    }

    #[tokio::test]
    async fn second_ctrl_c_while_recording_stops_waiting() {
        let (ledger, session) = session([1, 1, 0, 0, 0, 0, 0]);
        let alice = account(1);
        let intent = OperationIntent::transform(AssetKind::THORS_HAMMER).unwrap();
        let handle = session.submit(&alice, intent).await.unwrap();

        // Hold the post-receipt balance re-read in flight.
        let reads = ledger.balance_reads();
        ledger.pause_reads();
        ledger.confirm(&handle);
        tokio::time::timeout(Duration::from_secs(5), async {
            while ledger.balance_reads() == reads {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let orchestrator = session.orchestrator();
        assert_eq!(interrupt(orchestrator, &alice, Slot::Transform, false), Interrupt::Recording);
        assert_eq!(interrupt(orchestrator, &alice, Slot::Transform, true), Interrupt::StopWaiting);
        assert_eq!(orchestrator.state(&alice, Slot::Transform), TransactionState::Confirming);

        ledger.resume_reads();
        let state = orchestrator.wait_settled(&alice, Slot::Transform).await;
        assert!(matches!(state, TransactionState::Confirmed { reconciled: true, .. }));
    }
}

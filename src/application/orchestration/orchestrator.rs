//! Per-slot confirmation state machine.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};

use super::event::SlotEvent;
use crate::application::cache::BalanceCache;
use crate::application::cooldown::CooldownGate;
use crate::domain::{
    AccountId, FailureReason, LedgerCall, Slot, SubmissionHandle, TransactionId,
    TransactionRecord, TransactionState,
};
use crate::error::{DispatchError, LedgerError};
use crate::port::{Clock, Ledger};

type SlotKey = (AccountId, Slot);

/// Orchestrator tuning.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Default limit on waiting for a receipt. `None` waits indefinitely.
    pub confirmation_timeout: Option<Duration>,
    /// Capacity of the slot event broadcast channel.
    pub event_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: None,
            event_capacity: 256,
        }
    }
}

struct SlotEntry {
    record: TransactionRecord,
    /// Present only while the receipt watcher can still be cancelled.
    cancel: Option<oneshot::Sender<()>>,
}

struct Inner {
    ledger: Arc<dyn Ledger>,
    balances: Arc<BalanceCache>,
    cooldown: Arc<CooldownGate>,
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<SlotKey, SlotEntry>>,
    events: broadcast::Sender<SlotEvent>,
    config: OrchestratorConfig,
}

/// Drives at most one in-flight write per (account, slot) from submission
/// to a terminal state, publishing every transition.
///
/// Cheap to clone; clones share the same slots and event channel.
#[derive(Clone)]
pub struct TransactionOrchestrator {
    inner: Arc<Inner>,
}

impl TransactionOrchestrator {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        balances: Arc<BalanceCache>,
        cooldown: Arc<CooldownGate>,
        clock: Arc<dyn Clock>,
        config: OrchestratorConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                ledger,
                balances,
                cooldown,
                clock,
                slots: Mutex::new(HashMap::new()),
                events,
                config,
            }),
        }
    }

    /// Submit a write using the configured confirmation timeout.
    ///
    /// # Errors
    ///
    /// See [`submit_with_timeout`](Self::submit_with_timeout).
    pub async fn submit(
        &self,
        account: &AccountId,
        call: LedgerCall,
    ) -> Result<SubmissionHandle, DispatchError> {
        self.submit_with_timeout(account, call, self.inner.config.confirmation_timeout)
            .await
    }

    /// Reserve the call's slot, hand the write to the ledger and start
    /// watching for its receipt.
    ///
    /// Returns once the ledger has accepted the write; confirmation is
    /// reported through [`subscribe`](Self::subscribe).
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::SlotBusy`] if the slot holds a write in flight
    /// or a terminal record not yet [acknowledged](Self::acknowledge), or
    /// [`DispatchError::Ledger`] if the ledger refuses the write. In the
    /// latter case the slot has already moved to `Failed`.
    pub async fn submit_with_timeout(
        &self,
        account: &AccountId,
        call: LedgerCall,
        timeout: Option<Duration>,
    ) -> Result<SubmissionHandle, DispatchError> {
        let key: SlotKey = (account.clone(), call.slot());
        let id = self.inner.reserve(&key, call)?;

        let mut guard = AbandonOnDrop {
            inner: Arc::clone(&self.inner),
            key: key.clone(),
            id,
            armed: true,
        };
        let written = write(self.inner.ledger.as_ref(), account, call).await;
        guard.armed = false;

        let handle = match written {
            Ok(handle) => handle,
            Err(e) => {
                let reason = match &e {
                    LedgerError::Rejected(detail) => FailureReason::Rejected(detail.clone()),
                    LedgerError::Unavailable(detail) => {
                        FailureReason::LedgerUnavailable(detail.clone())
                    }
                };
                warn!(account = %account, slot = %key.1, error = %e, "Ledger refused write");
                self.inner
                    .finish(&key, id, TransactionState::Failed { reason });
                return Err(DispatchError::Ledger(e));
            }
        };

        let (cancel_tx, cancel_rx) = oneshot::channel();
        if !self.inner.confirming(&key, id, &handle, cancel_tx) {
            // Abandoned while the write was outstanding; nothing left to watch.
            return Ok(handle);
        }

        tokio::spawn(watch_receipt(
            Arc::clone(&self.inner),
            key,
            id,
            call,
            handle.clone(),
            timeout,
            cancel_rx,
        ));
        Ok(handle)
    }

    /// True when the slot holds no record at all.
    ///
    /// A terminal record occupies the slot until it is acknowledged, so
    /// `is_idle` agrees with [`state`](Self::state) returning `Idle`.
    #[must_use]
    pub fn is_idle(&self, account: &AccountId, slot: Slot) -> bool {
        !self
            .inner
            .slots
            .lock()
            .contains_key(&(account.clone(), slot))
    }

    /// Current state of a slot; `Idle` when no record exists.
    #[must_use]
    pub fn state(&self, account: &AccountId, slot: Slot) -> TransactionState {
        self.inner
            .slots
            .lock()
            .get(&(account.clone(), slot))
            .map_or(TransactionState::Idle, |entry| entry.record.state.clone())
    }

    /// Copy of the slot's record, in flight or terminal.
    #[must_use]
    pub fn record(&self, account: &AccountId, slot: Slot) -> Option<TransactionRecord> {
        self.inner
            .slots
            .lock()
            .get(&(account.clone(), slot))
            .map(|entry| entry.record.clone())
    }

    /// In-flight records for an account, in slot order.
    #[must_use]
    pub fn in_flight(&self, account: &AccountId) -> Vec<TransactionRecord> {
        let slots = self.inner.slots.lock();
        Slot::ALL
            .iter()
            .filter_map(|slot| slots.get(&(account.clone(), *slot)))
            .filter(|entry| entry.record.state.is_in_flight())
            .map(|entry| entry.record.clone())
            .collect()
    }

    /// Take a terminal record, returning the slot to `Idle`.
    ///
    /// Returns `None` if the slot is idle or still in flight, so each
    /// terminal record is handed out once.
    pub fn acknowledge(&self, account: &AccountId, slot: Slot) -> Option<TransactionRecord> {
        let key = (account.clone(), slot);
        let mut slots = self.inner.slots.lock();
        if !slots
            .get(&key)
            .is_some_and(|entry| entry.record.state.is_terminal())
        {
            return None;
        }
        let entry = slots.remove(&key)?;
        let _ = self
            .inner
            .events
            .send(SlotEvent::released(&entry.record, self.inner.clock.now()));
        debug!(account = %account, slot = %slot, transaction = %entry.record.id, "Acknowledged terminal record");
        Some(entry.record)
    }

    /// Stop watching a confirming write and mark the slot `Abandoned`.
    ///
    /// The write itself is not withdrawn and may still land; the next
    /// balance refresh picks up its effect. Returns `false` if the slot is
    /// not confirming or its outcome is already being recorded.
    pub fn cancel(&self, account: &AccountId, slot: Slot) -> bool {
        let key = (account.clone(), slot);
        let mut slots = self.inner.slots.lock();
        let Some(entry) = slots.get_mut(&key) else {
            return false;
        };
        if entry.record.state != TransactionState::Confirming {
            return false;
        }
        let Some(cancel) = entry.cancel.take() else {
            return false;
        };
        let _ = cancel.send(());
        entry.record.state = TransactionState::Abandoned;
        entry.record.updated_at = self.inner.clock.now();
        let _ = self.inner.events.send(SlotEvent::from_record(&entry.record));
        warn!(
            account = %account,
            slot = %slot,
            handle = ?entry.record.handle.as_ref().map(SubmissionHandle::as_str),
            "Stopped tracking write; it may still be confirmed on the ledger"
        );
        true
    }

    /// Receive every slot transition from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SlotEvent> {
        self.inner.events.subscribe()
    }

    /// Wait until the slot holds no in-flight write, returning its state.
    pub async fn wait_settled(&self, account: &AccountId, slot: Slot) -> TransactionState {
        let mut rx = self.subscribe();
        loop {
            let state = self.state(account, slot);
            if !state.is_in_flight() {
                return state;
            }
            match rx.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return self.state(account, slot),
            }
        }
    }
}

impl Inner {
    /// Claim an idle slot for a new record in the `Submitted` state.
    fn reserve(&self, key: &SlotKey, call: LedgerCall) -> Result<TransactionId, DispatchError> {
        let mut slots = self.slots.lock();
        if let Some(entry) = slots.get(key) {
            debug!(account = %key.0, slot = %key.1, state = entry.record.state.name(), "Slot busy");
            return Err(DispatchError::SlotBusy { slot: key.1 });
        }

        let record = TransactionRecord::submitted(key.0.clone(), call, self.clock.now());
        let id = record.id;
        let _ = self.events.send(SlotEvent::from_record(&record));
        info!(account = %key.0, slot = %key.1, transaction = %id, call = ?call, "Submitted write");
        slots.insert(
            key.clone(),
            SlotEntry {
                record,
                cancel: None,
            },
        );
        Ok(id)
    }

    /// Move a submitted record to `Confirming`.
    fn confirming(
        &self,
        key: &SlotKey,
        id: TransactionId,
        handle: &SubmissionHandle,
        cancel: oneshot::Sender<()>,
    ) -> bool {
        let mut slots = self.slots.lock();
        let Some(entry) = slots.get_mut(key) else {
            return false;
        };
        if entry.record.id != id || entry.record.state != TransactionState::Submitted {
            return false;
        }
        entry.record.handle = Some(handle.clone());
        entry.record.state = TransactionState::Confirming;
        entry.record.updated_at = self.clock.now();
        entry.cancel = Some(cancel);
        let _ = self.events.send(SlotEvent::from_record(&entry.record));
        info!(account = %key.0, slot = %key.1, handle = %handle, "Awaiting receipt");
        true
    }

    /// Take the cancel handle so the outcome can be recorded.
    ///
    /// Returns `false` if the record was cancelled.
    fn claim(&self, key: &SlotKey, id: TransactionId) -> bool {
        let mut slots = self.slots.lock();
        slots
            .get_mut(key)
            .filter(|entry| entry.record.id == id && entry.record.state.is_in_flight())
            .and_then(|entry| entry.cancel.take())
            .is_some()
    }

    /// Move an in-flight record to a terminal state and publish it.
    fn finish(&self, key: &SlotKey, id: TransactionId, state: TransactionState) -> bool {
        let mut slots = self.slots.lock();
        let Some(entry) = slots.get_mut(key) else {
            return false;
        };
        if entry.record.id != id || !entry.record.state.is_in_flight() {
            return false;
        }

        match &state {
            TransactionState::Confirmed { block, reconciled } => {
                info!(account = %key.0, slot = %key.1, block = block.number, reconciled, "Write confirmed");
            }
            other => match other.failure_reason() {
                Some(reason) => {
                    warn!(account = %key.0, slot = %key.1, reason = reason.code(), detail = %reason, "Write did not confirm");
                }
                None => {
                    info!(account = %key.0, slot = %key.1, state = other.name(), "Write tracking ended");
                }
            },
        }

        entry.record.state = state;
        entry.record.updated_at = self.clock.now();
        entry.cancel = None;
        let _ = self.events.send(SlotEvent::from_record(&entry.record));
        true
    }

    /// Bring the cache and cooldown view up to date after a confirmed write.
    ///
    /// Returns `false` if either re-read failed.
    async fn reconcile(&self, account: &AccountId, call: LedgerCall) -> bool {
        let floor = self.balances.next_sequence();
        let mut reconciled = true;
        if let Err(e) = self.balances.refresh_since(account, floor).await {
            warn!(account = %account, error = %e, "Balance refresh after confirmation failed");
            reconciled = false;
        }
        if matches!(call, LedgerCall::Acquire { .. }) {
            if let Err(e) = self.cooldown.refresh(account).await {
                warn!(account = %account, error = %e, "Cooldown refresh after mint failed");
                reconciled = false;
            }
        }
        reconciled
    }
}

/// Marks the slot abandoned if `submit` is dropped while the write is
/// outstanding.
struct AbandonOnDrop {
    inner: Arc<Inner>,
    key: SlotKey,
    id: TransactionId,
    armed: bool,
}

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        if self.armed
            && self
                .inner
                .finish(&self.key, self.id, TransactionState::Abandoned)
        {
            warn!(account = %self.key.0, slot = %self.key.1, "Submission dropped before the ledger answered");
        }
    }
}

async fn write(
    ledger: &dyn Ledger,
    account: &AccountId,
    call: LedgerCall,
) -> Result<SubmissionHandle, LedgerError> {
    match call {
        LedgerCall::Acquire { kind } => ledger.write_acquire(account, kind).await,
        LedgerCall::Transform { kind } => ledger.write_transform(account, kind).await,
        LedgerCall::Exchange { want, give } => ledger.write_exchange(account, want, give).await,
    }
}

async fn watch_receipt(
    inner: Arc<Inner>,
    key: SlotKey,
    id: TransactionId,
    call: LedgerCall,
    handle: SubmissionHandle,
    timeout: Option<Duration>,
    cancel: oneshot::Receiver<()>,
) {
    let receipt = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, inner.ledger.await_receipt(&handle))
                .await
                .ok(),
            None => Some(inner.ledger.await_receipt(&handle).await),
        }
    };

    let outcome = tokio::select! {
        _ = cancel => {
            debug!(account = %key.0, slot = %key.1, handle = %handle, "Receipt watcher cancelled");
            return;
        }
        outcome = receipt => outcome,
    };

    if !inner.claim(&key, id) {
        return;
    }

    let state = match outcome {
        None => TransactionState::Failed {
            reason: FailureReason::Timeout,
        },
        Some(Err(LedgerError::Unavailable(detail))) => TransactionState::Failed {
            reason: FailureReason::LedgerUnavailable(detail),
        },
        Some(Err(LedgerError::Rejected(detail))) => TransactionState::Failed {
            reason: FailureReason::Rejected(detail),
        },
        Some(Ok(receipt)) if receipt.succeeded() => TransactionState::Confirmed {
            reconciled: inner.reconcile(&key.0, call).await,
            block: receipt.block,
        },
        Some(Ok(receipt)) => TransactionState::Reverted {
            block: receipt.block,
        },
    };

    inner.finish(&key, id, state);
}

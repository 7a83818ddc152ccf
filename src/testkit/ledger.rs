//! In-memory [`Ledger`] with scripted receipts for testing.
//!
//! [`ScriptedLedger`] keeps a balance table and mint timestamps, applies the
//! same rules as the on-chain contracts when a write is confirmed, and lets
//! the test decide when (and how) each receipt resolves:
//!
//! - [`ScriptedLedger::confirm`] applies the write and resolves `Success`.
//! - [`ScriptedLedger::revert`] resolves `Reverted` without applying it.
//! - [`ScriptedLedger::fail_receipt`] makes `await_receipt` return an error.
//!
//! Balance reads can be paused with [`ScriptedLedger::pause_reads`] to hold
//! a refresh in flight. A read captures the table when it starts, so a write
//! confirmed while a paused read is outstanding is not visible to that read.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::domain::{
    AccountId, AssetKind, BlockInfo, LedgerCall, Receipt, ReceiptStatus, SubmissionHandle,
    ASSET_KIND_COUNT, COOLDOWN_WINDOW_SECS,
};
use crate::error::LedgerError;
use crate::port::{Clock, Ledger};

type ReceiptCell = Option<Result<Receipt, LedgerError>>;

struct PendingWrite {
    account: AccountId,
    call: LedgerCall,
    receipt: watch::Sender<ReceiptCell>,
}

/// Scripted ledger double. See the module docs.
pub struct ScriptedLedger {
    clock: Arc<dyn Clock>,
    balances: Mutex<HashMap<AccountId, [u128; ASSET_KIND_COUNT]>>,
    last_acquire: Mutex<HashMap<AccountId, u64>>,
    pending_writes: Mutex<HashMap<SubmissionHandle, PendingWrite>>,
    handle_order: Mutex<Vec<SubmissionHandle>>,
    next_write_error: Mutex<Option<LedgerError>>,
    read_error: Mutex<Option<LedgerError>>,
    reads_open: watch::Sender<bool>,
    auto_confirm: bool,
    next_block: AtomicU64,
    balance_reads: AtomicUsize,
    timestamp_reads: AtomicUsize,
    write_count: AtomicUsize,
}

impl ScriptedLedger {
    /// Create an empty ledger whose receipts resolve only when scripted.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (reads_open, _) = watch::channel(true);
        Self {
            clock,
            balances: Mutex::new(HashMap::new()),
            last_acquire: Mutex::new(HashMap::new()),
            pending_writes: Mutex::new(HashMap::new()),
            handle_order: Mutex::new(Vec::new()),
            next_write_error: Mutex::new(None),
            read_error: Mutex::new(None),
            reads_open,
            auto_confirm: false,
            next_block: AtomicU64::new(1),
            balance_reads: AtomicUsize::new(0),
            timestamp_reads: AtomicUsize::new(0),
            write_count: AtomicUsize::new(0),
        }
    }

    /// Confirm every write as soon as its receipt is awaited.
    pub fn auto_confirm(mut self) -> Self {
        self.auto_confirm = true;
        self
    }

    /// Seed catalog-ordered balances for an account.
    pub fn with_balances(self, account: &AccountId, balances: [u128; ASSET_KIND_COUNT]) -> Self {
        self.set_balances(account, balances);
        self
    }

    /// Seed the last-mint timestamp for an account.
    pub fn with_last_acquire(self, account: &AccountId, epoch_secs: u64) -> Self {
        self.last_acquire.lock().insert(account.clone(), epoch_secs);
        self
    }

    pub fn set_balances(&self, account: &AccountId, balances: [u128; ASSET_KIND_COUNT]) {
        self.balances.lock().insert(account.clone(), balances);
    }

    /// Current table entry for an account.
    pub fn balances_of(&self, account: &AccountId) -> [u128; ASSET_KIND_COUNT] {
        self.balances
            .lock()
            .get(account)
            .copied()
            .unwrap_or([0; ASSET_KIND_COUNT])
    }

    /// Make the next write fail synchronously with `error`.
    pub fn fail_next_write(&self, error: LedgerError) {
        *self.next_write_error.lock() = Some(error);
    }

    /// Make every read fail with `error` until cleared with `None`.
    pub fn fail_reads(&self, error: Option<LedgerError>) {
        *self.read_error.lock() = error;
    }

    /// Hold balance reads in flight until [`resume_reads`](Self::resume_reads).
    pub fn pause_reads(&self) {
        self.reads_open.send_replace(false);
    }

    pub fn resume_reads(&self) {
        self.reads_open.send_replace(true);
    }

    /// Apply the write and resolve its receipt as `Success`.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is unknown.
    pub fn confirm(&self, handle: &SubmissionHandle) {
        let writes = self.pending_writes.lock();
        let write = writes.get(handle).expect("unknown submission handle");
        self.apply(&write.account, write.call);
        let receipt = self.receipt(ReceiptStatus::Success);
        write.receipt.send_replace(Some(Ok(receipt)));
    }

    /// Resolve the receipt as `Reverted` without touching balances.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is unknown.
    pub fn revert(&self, handle: &SubmissionHandle) {
        let writes = self.pending_writes.lock();
        let write = writes.get(handle).expect("unknown submission handle");
        let receipt = self.receipt(ReceiptStatus::Reverted);
        write.receipt.send_replace(Some(Ok(receipt)));
    }

    /// Make `await_receipt` for `handle` fail with `error`.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is unknown.
    pub fn fail_receipt(&self, handle: &SubmissionHandle, error: LedgerError) {
        let writes = self.pending_writes.lock();
        let write = writes.get(handle).expect("unknown submission handle");
        write.receipt.send_replace(Some(Err(error)));
    }

    /// Handles in the order their writes were accepted.
    pub fn handles(&self) -> Vec<SubmissionHandle> {
        self.handle_order.lock().clone()
    }

    /// Most recently accepted handle.
    pub fn last_handle(&self) -> Option<SubmissionHandle> {
        self.handle_order.lock().last().cloned()
    }

    /// Number of `batch_balance_of` calls.
    pub fn balance_reads(&self) -> usize {
        self.balance_reads.load(Ordering::SeqCst)
    }

    /// Number of `last_acquire_timestamp` calls.
    pub fn timestamp_reads(&self) -> usize {
        self.timestamp_reads.load(Ordering::SeqCst)
    }

    /// Number of write calls, accepted or not.
    pub fn writes(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    fn receipt(&self, status: ReceiptStatus) -> Receipt {
        let number = self.next_block.fetch_add(1, Ordering::SeqCst);
        Receipt {
            status,
            block: BlockInfo {
                number,
                hash: Some(format!("0x{number:064x}")),
            },
        }
    }

    /// Contract-side validation, run when a write is submitted.
    fn check(&self, account: &AccountId, call: LedgerCall) -> Result<(), LedgerError> {
        let held = self.balances_of(account);
        let missing = |kinds: &[AssetKind]| kinds.iter().any(|k| held[k.index()] == 0);
        match call {
            LedgerCall::Acquire { .. } => {
                let last = self.last_acquire.lock().get(account).copied().unwrap_or(0);
                if self.clock.epoch_secs().saturating_sub(last) < COOLDOWN_WINDOW_SECS {
                    return Err(LedgerError::Rejected("cooldown active".into()));
                }
            }
            LedgerCall::Transform { kind } if missing(kind.recipe()) => {
                return Err(LedgerError::Rejected("insufficient balance to forge".into()));
            }
            LedgerCall::Exchange { give, .. } if missing(&[give]) => {
                return Err(LedgerError::Rejected("insufficient balance to trade".into()));
            }
            _ => {}
        }
        Ok(())
    }

    fn apply(&self, account: &AccountId, call: LedgerCall) {
        let mut balances = self.balances.lock();
        let held = balances
            .entry(account.clone())
            .or_insert([0; ASSET_KIND_COUNT]);
        match call {
            LedgerCall::Acquire { kind } => {
                held[kind.index()] += 1;
                self.last_acquire
                    .lock()
                    .insert(account.clone(), self.clock.epoch_secs());
            }
            LedgerCall::Transform { kind } => {
                for ingredient in kind.recipe() {
                    held[ingredient.index()] = held[ingredient.index()].saturating_sub(1);
                }
                held[kind.index()] += 1;
            }
            LedgerCall::Exchange { want, give } => {
                held[give.index()] = held[give.index()].saturating_sub(1);
                held[want.index()] += 1;
            }
        }
    }

    fn submit(&self, account: &AccountId, call: LedgerCall) -> Result<SubmissionHandle, LedgerError> {
        let n = self.write_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(error) = self.next_write_error.lock().take() {
            return Err(error);
        }
        self.check(account, call)?;

        let handle = SubmissionHandle::new(format!("0x{n:064x}"));
        let (receipt, _) = watch::channel(None);
        self.pending_writes.lock().insert(
            handle.clone(),
            PendingWrite {
                account: account.clone(),
                call,
                receipt,
            },
        );
        self.handle_order.lock().push(handle.clone());
        Ok(handle)
    }
}

#[async_trait]
impl Ledger for ScriptedLedger {
    async fn batch_balance_of(
        &self,
        accounts: &[AccountId],
        kinds: &[AssetKind],
    ) -> Result<Vec<u128>, LedgerError> {
        self.balance_reads.fetch_add(1, Ordering::SeqCst);
        if accounts.len() != kinds.len() {
            return Err(LedgerError::Unavailable("accounts and ids length mismatch".into()));
        }

        let table = self.balances.lock().clone();
        let values: Vec<u128> = accounts
            .iter()
            .zip(kinds)
            .map(|(account, kind)| table.get(account).map_or(0, |b| b[kind.index()]))
            .collect();

        tokio::task::yield_now().await;
        let mut open = self.reads_open.subscribe();
        let _ = open.wait_for(|open| *open).await;

        if let Some(error) = self.read_error.lock().clone() {
            return Err(error);
        }
        Ok(values)
    }

    async fn last_acquire_timestamp(&self, account: &AccountId) -> Result<u64, LedgerError> {
        self.timestamp_reads.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.read_error.lock().clone() {
            return Err(error);
        }
        Ok(self.last_acquire.lock().get(account).copied().unwrap_or(0))
    }

    async fn write_acquire(
        &self,
        account: &AccountId,
        kind: AssetKind,
    ) -> Result<SubmissionHandle, LedgerError> {
        self.submit(account, LedgerCall::Acquire { kind })
    }

    async fn write_transform(
        &self,
        account: &AccountId,
        kind: AssetKind,
    ) -> Result<SubmissionHandle, LedgerError> {
        self.submit(account, LedgerCall::Transform { kind })
    }

    async fn write_exchange(
        &self,
        account: &AccountId,
        want: AssetKind,
        give: AssetKind,
    ) -> Result<SubmissionHandle, LedgerError> {
        self.submit(account, LedgerCall::Exchange { want, give })
    }

    async fn await_receipt(&self, handle: &SubmissionHandle) -> Result<Receipt, LedgerError> {
        if self.auto_confirm {
            let pending = self
                .pending_writes
                .lock()
                .get(handle)
                .map(|w| w.receipt.borrow().is_none())
                .unwrap_or(false);
            if pending {
                self.confirm(handle);
            }
        }

        let mut rx = self
            .pending_writes
            .lock()
            .get(handle)
            .map(|w| w.receipt.subscribe())
            .ok_or_else(|| LedgerError::Unavailable(format!("unknown handle {handle}")))?;

        let cell = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| LedgerError::Unavailable("receipt channel closed".into()))?;
        match (*cell).clone() {
            Some(result) => result,
            None => Err(LedgerError::Unavailable("receipt missing".into())),
        }
    }

    fn ledger_name(&self) -> &'static str {
        "scripted"
    }
}

//! Per-account balance cache with coalesced refreshes.
//!
//! Each refresh is a full re-read of all seven kinds. Reads are numbered
//! when they are issued, and a completed read is installed only if its
//! number is higher than the installed snapshot's, so the cache always
//! holds the most recently *issued* read regardless of completion order.
//!
//! At most one read per account is outstanding. [`BalanceCache::refresh`]
//! joins it; [`BalanceCache::refresh_since`] joins it only if it was issued
//! after a given point, which is what reconciliation after a confirmed
//! write needs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::domain::{AccountId, AssetKind, BalanceSnapshot, ASSET_KIND_COUNT};
use crate::error::LedgerError;
use crate::port::{Clock, Ledger};

type ReadResult = Result<Arc<BalanceSnapshot>, LedgerError>;
type PendingRead = Shared<BoxFuture<'static, ReadResult>>;

#[derive(Default)]
struct AccountEntry {
    current: Option<Arc<BalanceSnapshot>>,
    pending: Option<(u64, PendingRead)>,
}

/// State shared between the cache and its in-flight reads.
struct CacheState {
    entries: Mutex<HashMap<AccountId, AccountEntry>>,
}

impl CacheState {
    /// Settle a read: clear it as pending and install its snapshot if newer.
    ///
    /// Returns the latest installed snapshot on success.
    fn complete(&self, account: &AccountId, sequence: u64, result: ReadResult) -> ReadResult {
        let mut entries = self.entries.lock();
        let entry = entries.entry(account.clone()).or_default();
        if entry.pending.as_ref().is_some_and(|(seq, _)| *seq == sequence) {
            entry.pending = None;
        }

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(account = %account, sequence, error = %e, "Balance refresh failed, keeping previous snapshot");
                return Err(e);
            }
        };

        let newer = entry
            .current
            .as_ref()
            .map_or(true, |current| current.sequence() < sequence);
        if newer {
            entry.current = Some(Arc::clone(&snapshot));
            debug!(account = %account, sequence, "Installed balance snapshot");
            Ok(snapshot)
        } else {
            debug!(account = %account, sequence, "Discarded out-of-order balance snapshot");
            Ok(entry.current.clone().unwrap_or(snapshot))
        }
    }
}

/// Thread-safe cache of the latest balance snapshot per account.
pub struct BalanceCache {
    ledger: Arc<dyn Ledger>,
    clock: Arc<dyn Clock>,
    state: Arc<CacheState>,
    sequence: AtomicU64,
}

impl BalanceCache {
    pub fn new(ledger: Arc<dyn Ledger>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger,
            clock,
            state: Arc::new(CacheState {
                entries: Mutex::new(HashMap::new()),
            }),
            sequence: AtomicU64::new(0),
        }
    }

    /// Latest snapshot for `account`, without I/O.
    #[must_use]
    pub fn current(&self, account: &AccountId) -> Option<Arc<BalanceSnapshot>> {
        self.state
            .entries
            .lock()
            .get(account)
            .and_then(|entry| entry.current.clone())
    }

    /// True while a read for `account` is outstanding.
    ///
    /// Diagnostic only: the answer can be stale by the time it is used.
    /// Tests use it to hold a read in flight before racing a second one.
    #[must_use]
    pub fn is_refreshing(&self, account: &AccountId) -> bool {
        self.state
            .entries
            .lock()
            .get(account)
            .is_some_and(|entry| entry.pending.is_some())
    }

    /// Sequence number the next issued read will receive.
    #[must_use]
    pub fn next_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst) + 1
    }

    /// Re-read all balances for `account`, joining an outstanding read.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] if the read fails; the previous
    /// snapshot stays installed.
    pub async fn refresh(&self, account: &AccountId) -> Result<Arc<BalanceSnapshot>, LedgerError> {
        self.refresh_since(account, 0).await
    }

    /// Re-read balances with a read issued at or after sequence `floor`.
    ///
    /// An outstanding read issued before `floor` is awaited first, then a
    /// new read is issued.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] if the qualifying read fails.
    pub async fn refresh_since(
        &self,
        account: &AccountId,
        floor: u64,
    ) -> Result<Arc<BalanceSnapshot>, LedgerError> {
        loop {
            let (sequence, read) = self.join_or_issue(account);
            let result = read.await;
            if sequence >= floor {
                return result;
            }
            debug!(account = %account, sequence, floor, "Joined read predates floor, issuing another");
        }
    }

    fn join_or_issue(&self, account: &AccountId) -> (u64, PendingRead) {
        let mut entries = self.state.entries.lock();
        let entry = entries.entry(account.clone()).or_default();
        if let Some((sequence, read)) = &entry.pending {
            debug!(account = %account, sequence, "Joining outstanding balance read");
            return (*sequence, read.clone());
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let read = self.issue(account.clone(), sequence);
        entry.pending = Some((sequence, read.clone()));
        (sequence, read)
    }

    fn issue(&self, account: AccountId, sequence: u64) -> PendingRead {
        let ledger = Arc::clone(&self.ledger);
        let clock = Arc::clone(&self.clock);
        let state = Arc::clone(&self.state);

        async move {
            let accounts = vec![account.clone(); ASSET_KIND_COUNT];
            let result = ledger
                .batch_balance_of(&accounts, &AssetKind::ALL)
                .await
                .and_then(|values| to_balances(&values))
                .map(|balances| {
                    Arc::new(BalanceSnapshot::new(
                        account.clone(),
                        balances,
                        sequence,
                        clock.now(),
                    ))
                });
            state.complete(&account, sequence, result)
        }
        .boxed()
        .shared()
    }
}

fn to_balances(values: &[u128]) -> Result<[u128; ASSET_KIND_COUNT], LedgerError> {
    <[u128; ASSET_KIND_COUNT]>::try_from(values).map_err(|_| {
        LedgerError::Unavailable(format!(
            "expected {ASSET_KIND_COUNT} balances, ledger returned {}",
            values.len()
        ))
    })
}

//! Builders for domain primitives used across tests.

use std::sync::Arc;

use crate::domain::AccountId;
use crate::testkit::clock::ManualClock;
use crate::testkit::ledger::ScriptedLedger;

/// Epoch seconds the canonical test clock starts at.
pub const T0: i64 = 1_700_000_000;

/// Deterministic account address whose last byte is `n`.
pub fn account(n: u8) -> AccountId {
    AccountId::parse(&format!("0x{}{n:02x}", "00".repeat(19))).expect("valid test address")
}

/// A manual clock at [`T0`] and an empty scripted ledger reading it.
pub fn ledger_at_t0() -> (Arc<ManualClock>, ScriptedLedger) {
    let clock = Arc::new(ManualClock::at(T0));
    let ledger = ScriptedLedger::new(clock.clone());
    (clock, ledger)
}

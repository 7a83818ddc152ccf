//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`ledger`] - [`ScriptedLedger`](ledger::ScriptedLedger), an in-memory
//!   [`Ledger`](crate::port::Ledger) with test-controlled receipts.
//! - [`clock`] - [`ManualClock`](clock::ManualClock) for deterministic time.
//! - [`domain`] - Builders for accounts and a canonical clock/ledger pair.

pub mod clock;
pub mod domain;
pub mod ledger;

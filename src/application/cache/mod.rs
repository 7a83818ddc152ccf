//! Runtime caches used by application services.
//!
//! - [`balance::BalanceCache`]: Per-account balance snapshots with coalesced
//!   refreshes

pub mod balance;

pub use balance::BalanceCache;

//! Application services (use cases).
//!
//! These services coordinate the domain model and the [`Ledger`](crate::port::Ledger)
//! port to implement acquire, transform and exchange flows.

pub mod cache;
pub mod cooldown;
pub mod dispatch;
pub mod orchestration;
pub mod session;

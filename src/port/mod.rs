//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     ▼                                                       ▼
//! ┌─────────┐                                           ┌───────────┐
//! │ Ledger  │                                           │   Clock   │
//! │ Adapter │                                           │           │
//! └─────────┘                                           └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`Ledger`] - Balance reads, mint timestamps, writes and receipts
//! - [`Clock`] - Wall-clock time used by the cooldown gate

pub mod outbound;

pub use outbound::clock::{Clock, SystemClock};
pub use outbound::ledger::Ledger;

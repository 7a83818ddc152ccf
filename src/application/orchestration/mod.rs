//! Transaction lifecycle orchestration.
//!
//! Each account has three independent slots (Acquire, Transform, Exchange).
//! A slot holds at most one in-flight write, which moves through
//!
//! ```text
//! Idle → Submitted → Confirming → Confirmed | Failed | Reverted
//!                         │
//!                         └──────→ Abandoned   (cancel)
//! ```
//!
//! A confirmed write triggers a balance re-read (and a cooldown re-read for
//! mints) before the terminal event is published, so subscribers that see
//! `Confirmed { reconciled: true, .. }` can read the reconciled cache. When
//! that re-read fails the event carries `reconciled: false`.
//!
//! A terminal record keeps its slot busy until the caller acknowledges it.
//!
//! # Modules
//!
//! - [`orchestrator`]: Slot table, receipt watchers and the public facade
//! - [`event`]: [`SlotEvent`] notifications

pub mod event;
pub mod orchestrator;

pub use event::SlotEvent;
pub use orchestrator::{OrchestratorConfig, TransactionOrchestrator};

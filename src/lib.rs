//! Forgekeeper - transaction-lifecycle orchestration for an asset-forging
//! ledger.
//!
//! The ledger tracks seven asset kinds per account. Primary kinds (Bronze,
//! Silver, Gold) are minted under a 60-second per-account cooldown and can
//! be traded among themselves; derived kinds are forged by burning one unit
//! of each kind in their recipe.
//!
//! # Architecture
//!
//! - [`domain`] - Asset catalog, intents, balance snapshots, cooldown and
//!   transaction states. No I/O.
//! - [`port`] - The [`port::Ledger`] and [`port::Clock`] traits the
//!   application depends on.
//! - [`application`] - Balance cache, cooldown gate, per-slot transaction
//!   orchestrator and the dispatcher that checks local preconditions before
//!   any write.
//! - [`adapter`] - The EVM JSON-RPC ledger (requires `evm`) and the CLI.
//! - [`infrastructure`] - Configuration loading and wiring.
//!
//! # Features
//!
//! - `evm` (default) - EVM ledger client and the `forgekeeper` binary
//! - `testkit` - Scripted ledger and manual clock for tests
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use forgekeeper::domain::{AccountId, AssetKind, OperationIntent};
//! use forgekeeper::infrastructure::bootstrap::{build_session, connect_ledger};
//! use forgekeeper::infrastructure::config::settings::Config;
//!
//! # async fn run() -> forgekeeper::error::Result<()> {
//! let config = Config::load_or_default("config.toml")?;
//! let ledger = connect_ledger(&config)?;
//! let session = build_session(&config, ledger.clone());
//!
//! let account = AccountId::parse("0x2c7536e3605d9c16a7a3d7b1898e529396a65c23")?;
//! let intent = OperationIntent::acquire(AssetKind::BRONZE)?;
//! session.submit(&account, intent).await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

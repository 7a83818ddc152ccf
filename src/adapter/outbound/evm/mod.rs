//! EVM ledger adapter.
//!
//! Talks to the forge contract (writes) and the balance-ledger contract
//! (reads) over JSON-RPC. The network settings compile without the `evm`
//! feature so configuration can be loaded and validated on its own.

pub mod settings;

#[cfg(feature = "evm")]
mod contract;
#[cfg(feature = "evm")]
pub mod ledger;

#[cfg(feature = "evm")]
pub use ledger::EvmLedger;
pub use settings::{EvmRuntimeConfig, NetworkConfig};

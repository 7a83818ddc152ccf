//! Composition root for runtime wiring.

use std::sync::Arc;

use tracing::info;

use crate::application::session::Session;
use crate::infrastructure::config::settings::Config;
use crate::port::{Clock, Ledger, SystemClock};

#[cfg(feature = "evm")]
use crate::adapter::outbound::evm::EvmLedger;
#[cfg(feature = "evm")]
use crate::error::Result;

/// Build the EVM ledger described by `config`.
///
/// # Errors
///
/// Returns a configuration error for a malformed endpoint, contract
/// address or signing key.
#[cfg(feature = "evm")]
#[allow(clippy::result_large_err)]
pub fn connect_ledger(config: &Config) -> Result<Arc<EvmLedger>> {
    let ledger = EvmLedger::connect(&config.evm_runtime())?;
    info!(
        chain_id = ledger.chain_id(),
        signer = ?ledger.signer().map(|a| a.to_string()),
        "Ledger client ready"
    );
    Ok(Arc::new(ledger))
}

/// Wire a session on `ledger` using the system clock.
pub fn build_session(config: &Config, ledger: Arc<dyn Ledger>) -> Session {
    build_session_with_clock(config, ledger, Arc::new(SystemClock))
}

/// Wire a session on `ledger` with an explicit clock.
pub fn build_session_with_clock(
    config: &Config,
    ledger: Arc<dyn Ledger>,
    clock: Arc<dyn Clock>,
) -> Session {
    info!(ledger = ledger.ledger_name(), "Building session");
    Session::new(ledger, clock, config.orchestrator())
}

//! Handlers for the read-only commands: `balances`, `cooldown`, `wallet`.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::evm::EvmLedger;
use crate::application::session::Session;
use crate::domain::{AccountId, BalanceSnapshot, CooldownState};
use crate::error::{ConfigError, Result};
use crate::infrastructure::bootstrap::{build_session, connect_ledger};
use crate::infrastructure::config::settings::Config;

/// Connect to the configured ledger and wire a session on it.
#[allow(clippy::result_large_err)]
pub(crate) fn open(config: &Config) -> Result<(Arc<EvmLedger>, Session)> {
    let ledger = connect_ledger(config)?;
    let session = build_session(config, ledger.clone());
    Ok((ledger, session))
}

/// The explicit account, or the signer's when none was given.
#[allow(clippy::result_large_err)]
pub(crate) fn resolve_account(ledger: &EvmLedger, account: Option<AccountId>) -> Result<AccountId> {
    account.or_else(|| ledger.signer()).ok_or_else(|| {
        ConfigError::MissingField {
            field: "WALLET_PRIVATE_KEY (or pass --account)",
        }
        .into()
    })
}

#[derive(Tabled)]
struct BalanceRow {
    #[tabled(rename = "ID")]
    id: u8,
    #[tabled(rename = "Asset")]
    name: &'static str,
    #[tabled(rename = "Balance")]
    units: u128,
}

pub(crate) fn print_balances(snapshot: &BalanceSnapshot) {
    if output::is_json() {
        let balances: Vec<_> = snapshot
            .iter()
            .map(|(kind, units)| {
                json!({
                    "id": kind.id(),
                    "name": kind.name(),
                    "units": units.to_string(),
                })
            })
            .collect();
        output::json_output(json!({
            "command": "balances",
            "account": snapshot.account(),
            "sequence": snapshot.sequence(),
            "fetched_at": snapshot.fetched_at().to_rfc3339(),
            "balances": balances,
        }));
        return;
    }

    let rows: Vec<BalanceRow> = snapshot
        .iter()
        .map(|(kind, units)| BalanceRow {
            id: kind.id(),
            name: kind.name(),
            units,
        })
        .collect();
    output::section("Balances");
    output::field("Account", snapshot.account());
    output::lines(&Table::new(rows).to_string());
}

fn format_epoch(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| Utc.timestamp_opt(s, 0).single())
        .map_or_else(|| secs.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

fn print_cooldown(state: &CooldownState) {
    let remaining = state.remaining_at(state.observed_at_epoch_secs());
    let last = state.last_acquire_epoch_secs();

    if output::is_json() {
        output::json_output(json!({
            "command": "cooldown",
            "account": state.account(),
            "locked": state.is_locked(),
            "remaining_secs": remaining,
            "window_secs": state.window_secs(),
            "last_mint_epoch_secs": last,
            "observed_at_epoch_secs": state.observed_at_epoch_secs(),
        }));
        return;
    }

    output::section("Mint Cooldown");
    output::field("Account", state.account());
    if last == 0 {
        output::field("Last mint", output::muted("never"));
    } else {
        output::field("Last mint", format_epoch(last));
    }
    if state.is_locked() {
        output::field("Status", output::negative(format!("locked, {remaining}s remaining")));
    } else {
        output::field("Status", output::positive("ready"));
    }
}

/// Execute `balances`.
pub async fn execute_balances(config: &Config, account: Option<AccountId>) -> Result<()> {
    let (ledger, session) = open(config)?;
    let account = resolve_account(&ledger, account)?;

    let pb = output::spinner("Reading balances...");
    match session.balances().refresh(&account).await {
        Ok(snapshot) => {
            pb.finish_and_clear();
            print_balances(&snapshot);
            Ok(())
        }
        Err(e) => {
            output::spinner_fail(&pb, "Balance read failed");
            Err(e.into())
        }
    }
}

/// Execute `cooldown`.
pub async fn execute_cooldown(config: &Config, account: Option<AccountId>) -> Result<()> {
    let (ledger, session) = open(config)?;
    let account = resolve_account(&ledger, account)?;

    let state = session.cooldown().state(&account).await?;
    print_cooldown(&state);
    Ok(())
}

/// Execute `wallet`.
pub async fn execute_wallet(config: &Config) -> Result<()> {
    let (ledger, _session) = open(config)?;
    let account = resolve_account(&ledger, None)?;

    let pb = output::spinner("Checking network...");
    if let Err(e) = ledger.verify_network().await {
        output::spinner_fail(&pb, "Network check failed");
        return Err(e);
    }
    output::spinner_success(&pb, "Network verified");

    let native = ledger.native_balance(&account).await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "wallet",
            "account": account,
            "chain_id": ledger.chain_id(),
            "native_balance": native.to_string(),
        }));
        return Ok(());
    }

    output::section("Wallet");
    output::field("Account", output::highlight(&account));
    output::field("Chain ID", ledger.chain_id());
    output::field("Native", format!("{native} ETH"));
    if native.is_zero() {
        output::hint("fund the account with testnet ETH to pay for gas");
    }
    Ok(())
}

//! Command-line interface definitions.
//!
//! Defines the CLI structure for forgekeeper using `clap`: read-only
//! inspection of balances and the mint cooldown, and the three write
//! operations (mint, forge, trade) tracked until they settle.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::paths;
use crate::domain::{AccountId, AssetKind};

/// Mint, forge and trade game assets on an EVM ledger
#[derive(Parser, Debug)]
#[command(name = "forgekeeper")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, short = 'c', global = true, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the forgekeeper CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List asset kinds and forging recipes
    Assets,

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Show asset balances for an account
    Balances(AccountArgs),

    /// Show the mint cooldown for an account
    Cooldown(AccountArgs),

    /// Show the signing account, its native balance and the network
    Wallet,

    /// Mint one unit of a primary asset
    Mint(MintArgs),

    /// Forge a derived asset by burning its recipe
    Forge(ForgeArgs),

    /// Trade one primary asset for another
    Trade(TradeArgs),
}

/// Subcommands for `forgekeeper config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration with defaults applied.
    Show,
    /// Validate the configuration file.
    Validate,
}

/// Account selection for read-only commands.
#[derive(Args, Debug)]
pub struct AccountArgs {
    /// Account address (defaults to the configured signer)
    #[arg(long, short = 'a')]
    pub account: Option<AccountId>,
}

/// Confirmation wait override shared by write commands.
#[derive(Args, Debug)]
pub struct WaitArgs {
    /// Give up waiting for a receipt after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Arguments for `forgekeeper mint`.
#[derive(Args, Debug)]
pub struct MintArgs {
    /// Asset to mint (id or name, e.g. `0` or `bronze`)
    #[arg(value_parser = parse_asset)]
    pub kind: AssetKind,

    #[command(flatten)]
    pub wait: WaitArgs,
}

/// Arguments for `forgekeeper forge`.
#[derive(Args, Debug)]
pub struct ForgeArgs {
    /// Asset to forge (id or name, e.g. `3` or `thors-hammer`)
    #[arg(value_parser = parse_asset)]
    pub kind: AssetKind,

    #[command(flatten)]
    pub wait: WaitArgs,
}

/// Arguments for `forgekeeper trade`.
#[derive(Args, Debug)]
pub struct TradeArgs {
    /// Asset to receive
    #[arg(long, value_parser = parse_asset)]
    pub want: AssetKind,

    /// Asset to burn in exchange
    #[arg(long, value_parser = parse_asset)]
    pub give: AssetKind,

    #[command(flatten)]
    pub wait: WaitArgs,
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Parse an asset kind from its numeric id or its name.
///
/// Names match case-insensitively, ignoring punctuation and spaces, so
/// `"Thor's Hammer"`, `thors-hammer` and `thorshammer` are equivalent.
pub fn parse_asset(value: &str) -> Result<AssetKind, String> {
    let value = value.trim();
    if let Ok(id) = value.parse::<u64>() {
        return AssetKind::try_new(id).map_err(|e| e.to_string());
    }
    let wanted = normalize(value);
    AssetKind::ALL
        .into_iter()
        .find(|kind| normalize(kind.name()) == wanted)
        .ok_or_else(|| format!("unknown asset '{value}' (expected 0-6 or a name)"))
}

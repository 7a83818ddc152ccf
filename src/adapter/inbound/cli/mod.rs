//! CLI module graph and command dispatch.

pub mod assets;
pub mod command;
pub mod config;
pub mod inspect;
pub mod output;
pub mod paths;
pub mod write;

use command::{Cli, Commands, ConfigCommand};

use crate::domain::OperationIntent;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Load configuration and start logging for commands that talk to the ledger.
#[allow(clippy::result_large_err)]
fn prepare(cli: &Cli) -> Result<Config> {
    let config = Config::load_or_default(&cli.config)?;
    let logging = match cli.verbose {
        0 => config.logging.clone(),
        1 => config.logging.with_level("debug"),
        _ => config.logging.with_level("trace"),
    };
    logging.init();
    Ok(config)
}

/// Run the parsed command.
pub async fn execute(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Assets => assets::execute(),
        Commands::Config(ConfigCommand::Show) => config::execute_show(&cli.config),
        Commands::Config(ConfigCommand::Validate) => config::execute_validate(&cli.config),
        Commands::Balances(args) => {
            let config = prepare(&cli)?;
            inspect::execute_balances(&config, args.account.clone()).await
        }
        Commands::Cooldown(args) => {
            let config = prepare(&cli)?;
            inspect::execute_cooldown(&config, args.account.clone()).await
        }
        Commands::Wallet => {
            let config = prepare(&cli)?;
            inspect::execute_wallet(&config).await
        }
        Commands::Mint(args) => {
            let intent = OperationIntent::acquire(args.kind)?;
            let config = prepare(&cli)?;
            write::execute(&config, intent, args.wait.timeout).await
        }
        Commands::Forge(args) => {
            let intent = OperationIntent::transform(args.kind)?;
            let config = prepare(&cli)?;
            write::execute(&config, intent, args.wait.timeout).await
        }
        Commands::Trade(args) => {
            let intent = OperationIntent::exchange(args.want, args.give)?;
            let config = prepare(&cli)?;
            write::execute(&config, intent, args.wait.timeout).await
        }
    }
}

use clap::Parser;
use forgekeeper::adapter::inbound::cli::command::Cli;
use forgekeeper::adapter::inbound::cli::{self, output};
use tracing::error;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    output::configure(output::OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    if let Err(e) = cli::execute(cli).await {
        error!(error = %e, "Command failed");
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

//! Binary entry point for the support-companion bot.

use anyhow::Result;
use clap::Parser;
use solace_bot::config::load_config;
use solace_bot::{run_bot, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => {
            let config = load_config(token)?;
            run_bot(config).await
        }
    }
}

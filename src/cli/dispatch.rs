use anyhow::Result;
use soultest_cli::LoadedConfig;

use super::commands::Commands;
use super::config::cmd_config;
use super::env::CliArgs;
use super::plan::{cmd_frontier, cmd_order, cmd_validate};

pub async fn dispatch(cli: &CliArgs, loaded: &LoadedConfig) -> Result<()> {
    match cli.command.clone() {
        Commands::Validate(args) => cmd_validate(args).await,
        Commands::Order(args) => cmd_order(args).await,
        Commands::Frontier(args) => cmd_frontier(args).await,
        Commands::Config(args) => cmd_config(args, loaded),
    }
}

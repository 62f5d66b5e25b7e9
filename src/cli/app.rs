use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::init_logging;
use soultest_cli::load_config;

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();

    init_logging(&cli.log_level, cli.debug, cli.log_format)?;
    info!("Starting SoulTest v{}", env!("CARGO_PKG_VERSION"));

    let loaded = load_config(cli.config.as_deref()).await?;

    match dispatch(&cli, &loaded).await {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {:#}", err);
            Err(err)
        }
    }
}

use anyhow::Result;
use clap::{Args, Subcommand};
use soultest_cli::LoadedConfig;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
}

pub fn cmd_config(args: ConfigArgs, loaded: &LoadedConfig) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            println!("# Effective configuration ({})", loaded.path.display());
            print!("{}", serde_yaml::to_string(&loaded.config)?);
        }
    }
    Ok(())
}

//! Runner configuration
//!
//! Loaded from YAML. Every section and field is optional; missing values
//! fall back to the defaults below.

use std::path::{Path, PathBuf};

use action_flow::ExecutorConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

/// Environment variable holding the oracle API key unless configured otherwise
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub executor: ExecutorConfig,
    pub scheduler: SchedulerConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healing: Option<HealingConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Frontier members executed concurrently, each on its own session
    pub max_parallel: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { max_parallel: 1 }
    }
}

/// OpenAI-compatible healing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealingConfig {
    pub api_base: String,
    pub model: String,
    pub api_key_env: String,
    pub temperature: f32,
    pub timeout_ms: u64,
}

impl Default for HealingConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            temperature: 0.0,
            timeout_ms: 30_000,
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<()> {
        self.executor
            .validate()
            .context("Invalid executor configuration")?;
        if self.scheduler.max_parallel == 0 {
            bail!("scheduler.max_parallel must be at least 1");
        }
        Ok(())
    }
}

pub struct LoadedConfig {
    pub config: RunnerConfig,
    pub path: PathBuf,
}

/// Resolve the config path: explicit > ./config/soultest.yaml > user config dir
pub fn resolve_config_path(config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        return Ok(path.to_path_buf());
    }
    let local_config = PathBuf::from("config/soultest.yaml");
    if local_config.exists() {
        return Ok(local_config);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("soultest");
    path.push("config.yaml");
    Ok(path)
}

pub async fn load_config(config_path: Option<&Path>) -> Result<LoadedConfig> {
    let config_path = resolve_config_path(config_path)?;

    let config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .await
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        let config: RunnerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;
        info!("Loaded configuration from: {}", config_path.display());
        config
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        RunnerConfig::default()
    };

    config.validate()?;
    Ok(LoadedConfig {
        config,
        path: config_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = RunnerConfig::default();
        assert_eq!(config.executor.max_attempts, 3);
        assert_eq!(config.executor.retry_delay_ms, 1_000);
        assert_eq!(config.scheduler.max_parallel, 1);
        assert!(config.healing.is_none());
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn loads_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "executor:\n  max_attempts: 5\nscheduler:\n  max_parallel: 2\nhealing:\n  model: local-healer\n"
        )
        .unwrap();

        let loaded = load_config(Some(file.path())).await.unwrap();
        assert_eq!(loaded.config.executor.max_attempts, 5);
        assert_eq!(loaded.config.executor.resolve_timeout_ms, 2_000);
        assert_eq!(loaded.config.scheduler.max_parallel, 2);
        let healing = loaded.config.healing.unwrap();
        assert_eq!(healing.model, "local-healer");
        assert_eq!(healing.api_key_env, DEFAULT_API_KEY_ENV);
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let loaded = load_config(Some(&path)).await.unwrap();
        assert_eq!(loaded.config, RunnerConfig::default());
        assert_eq!(loaded.path, path);
    }

    #[tokio::test]
    async fn invalid_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "scheduler:\n  max_parallel: 0").unwrap();
        assert!(load_config(Some(file.path())).await.is_err());

        let mut broken = tempfile::NamedTempFile::new().unwrap();
        writeln!(broken, "executor: [not, a, map]").unwrap();
        let err = load_config(Some(broken.path())).await.err().unwrap();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }
}

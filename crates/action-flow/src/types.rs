//! Executor configuration

use crate::errors::FlowError;
use action_locator::{DEFAULT_MAX_DOM_CHARS, DEFAULT_RESOLVE_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of attempts with the original selector
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default fixed delay between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1_000);

/// Tunables for [`crate::DefaultCommandExecutor`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Attempts with the original selector before giving up or healing
    pub max_attempts: u32,

    /// Fixed delay between attempts
    pub retry_delay_ms: u64,

    /// Bounded wait per selector strategy during resolution
    pub resolve_timeout_ms: u64,

    /// Consult the healing oracle after exhausted resolution failures
    pub self_heal: bool,

    /// DOM snapshot cap for the healing oracle
    pub max_dom_chars: usize,

    /// Attach a base64 screenshot to failure diagnostics
    pub capture_screenshot_on_failure: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
            resolve_timeout_ms: DEFAULT_RESOLVE_TIMEOUT.as_millis() as u64,
            self_heal: true,
            max_dom_chars: DEFAULT_MAX_DOM_CHARS,
            capture_screenshot_on_failure: false,
        }
    }
}

impl ExecutorConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), FlowError> {
        if self.max_attempts == 0 {
            return Err(FlowError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.resolve_timeout_ms == 0 {
            return Err(FlowError::InvalidConfig(
                "resolve_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExecutorConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_delay(), Duration::from_secs(1));
        assert_eq!(config.resolve_timeout(), Duration::from_secs(2));
        assert!(config.self_heal);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: ExecutorConfig = serde_json::from_str(r#"{"max_attempts":5}"#).unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.retry_delay_ms, 1_000);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = ExecutorConfig {
            max_attempts: 0,
            ..ExecutorConfig::default()
        };
        assert!(matches!(config.validate(), Err(FlowError::InvalidConfig(_))));
    }
}

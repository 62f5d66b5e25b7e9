//! Command execution error types

use action_locator::LocatorError;
use action_primitives::{Command, DriverError, ExecutionResult};
use thiserror::Error;

/// Command execution errors
#[derive(Debug, Error, Clone)]
pub enum FlowError {
    /// Element resolution failed
    #[error(transparent)]
    Locator(#[from] LocatorError),

    /// Browser driver rejected the action
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Execution was cancelled before the command finished
    #[error("Command cancelled")]
    Cancelled,

    /// Executor configuration is unusable
    #[error("Invalid executor configuration: {0}")]
    InvalidConfig(String),

    /// A command failed after all retries (and healing, if any)
    #[error("Command '{command}' failed after {attempts} attempt(s): {message}")]
    CommandExecution {
        command: String,
        attempts: u32,
        message: String,
    },
}

impl FlowError {
    /// Whether another attempt with the same command can change the outcome
    pub fn is_retryable(&self) -> bool {
        match self {
            FlowError::Driver(err) => err.is_retryable(),
            FlowError::Locator(_) | FlowError::CommandExecution { .. } => true,
            FlowError::Cancelled | FlowError::InvalidConfig(_) => false,
        }
    }

    /// Wrap a failed execution result; the original message is kept verbatim
    pub fn command_failed(command: &Command, result: &ExecutionResult) -> Self {
        FlowError::CommandExecution {
            command: command.to_string(),
            attempts: result.attempts,
            message: result
                .error
                .clone()
                .unwrap_or_else(|| "unknown error".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::SelectorSpec;
    use std::time::Duration;

    #[test]
    fn test_unsupported_driver_action_is_final() {
        assert!(!FlowError::from(DriverError::Unsupported("hover".into())).is_retryable());
        assert!(FlowError::from(DriverError::Protocol("socket closed".into())).is_retryable());
        assert!(!FlowError::Cancelled.is_retryable());
    }

    #[test]
    fn test_transparent_driver_message() {
        let err = FlowError::from(DriverError::Timeout("5000ms".to_string()));
        assert_eq!(err.to_string(), "Timeout exceeded: 5000ms");
    }

    #[test]
    fn test_command_failed_keeps_original_message() {
        let command = Command::click(SelectorSpec::css("#buy")).unwrap();
        let result = ExecutionResult::failure("Element not found: css:#buy", Duration::ZERO, 3);
        let err = FlowError::command_failed(&command, &result);
        assert_eq!(
            err.to_string(),
            "Command 'click css:#buy' failed after 3 attempt(s): Element not found: css:#buy"
        );
    }
}

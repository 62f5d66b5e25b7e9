//! Error types for action primitives

use thiserror::Error;

/// Errors raised while building commands and selectors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Command type and parameters do not form a valid command
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Selector strategy is not part of the supported set
    #[error("Unknown selector strategy: {0}")]
    UnknownStrategy(String),

    /// Selector value is empty or malformed
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

/// Failures reported by a browser driver.
///
/// The display strings are what failure classification looks at, so each
/// variant keeps the wording a driver would produce.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Element could not be located
    #[error("Element not found: {0}")]
    NotFound(String),

    /// Bounded wait exceeded
    #[error("Timeout exceeded: {0}")]
    Timeout(String),

    /// Page navigation failed
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// Assertion against page state did not hold
    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// Browser protocol or transport error
    #[error("Driver error: {0}")]
    Protocol(String),

    /// Driver does not implement the requested capability
    #[error("Unsupported by driver: {0}")]
    Unsupported(String),
}

impl DriverError {
    /// Check if error is worth retrying
    pub fn is_retryable(&self) -> bool {
        !matches!(self, DriverError::Unsupported(_))
    }
}

//! Core data types for command execution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::command::Command;
use crate::selector::SelectorStrategy;

/// Live element reference returned by a browser driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-specific element reference
    pub id: String,

    /// Strategy that located the element
    pub strategy: SelectorStrategy,

    /// Selector value that located the element
    pub selector: String,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>, strategy: SelectorStrategy, selector: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            strategy,
            selector: selector.into(),
        }
    }
}

/// Coarse classification of a terminal command failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCategory {
    SelectorNotFound,
    Timeout,
    AssertionMismatch,
    NavigationError,
    Unknown,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::SelectorNotFound => "SELECTOR_NOT_FOUND",
            FailureCategory::Timeout => "TIMEOUT",
            FailureCategory::AssertionMismatch => "ASSERTION_MISMATCH",
            FailureCategory::NavigationError => "NAVIGATION_ERROR",
            FailureCategory::Unknown => "UNKNOWN",
        }
    }

    /// Whether the failure points at element resolution, the only kind healing addresses
    pub fn is_resolution_problem(&self) -> bool {
        matches!(
            self,
            FailureCategory::SelectorNotFound | FailureCategory::Timeout
        )
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostics captured when a command ultimately fails
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    pub category: FailureCategory,

    /// Terminal error message of the last retry attempt
    pub message: String,

    /// Page URL at failure time, when the driver could report it
    pub url: Option<String>,

    /// Base64-encoded screenshot, when capture is enabled and supported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,

    /// Number of attempts made before giving up
    pub attempts: u32,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub captured_at: DateTime<Utc>,
}

/// Outcome of executing one command
///
/// Command-level failures are reported here rather than raised, so the
/// caller decides what happens to the owning unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the command eventually succeeded
    pub success: bool,

    /// Error message (if failed)
    pub error: Option<String>,

    /// Wall-clock time spent, including retries and healing
    pub duration_ms: u64,

    /// Attempts made with the original selector
    pub attempts: u32,

    /// Whether success came from a healed selector
    pub refined: bool,

    /// Command actually executed when healing replaced the selector
    pub refined_command: Option<Command>,

    /// Diagnostics for failed commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureContext>,
}

impl ExecutionResult {
    /// Create a successful result
    pub fn success(duration: Duration, attempts: u32) -> Self {
        Self {
            success: true,
            error: None,
            duration_ms: duration.as_millis() as u64,
            attempts,
            refined: false,
            refined_command: None,
            failure: None,
        }
    }

    /// Create a failed result
    pub fn failure(error: impl Into<String>, duration: Duration, attempts: u32) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            duration_ms: duration.as_millis() as u64,
            attempts,
            refined: false,
            refined_command: None,
            failure: None,
        }
    }

    /// Mark as succeeded through a healed command
    pub fn with_refined(mut self, command: Command) -> Self {
        self.refined = true;
        self.refined_command = Some(command);
        self
    }

    /// Attach failure diagnostics
    pub fn with_failure_context(mut self, context: FailureContext) -> Self {
        self.failure = Some(context);
        self
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn category(&self) -> Option<FailureCategory> {
        self.failure.as_ref().map(|context| context.category)
    }
}

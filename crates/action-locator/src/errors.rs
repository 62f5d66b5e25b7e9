//! Error types for locator system

use action_primitives::SelectorStrategy;
use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocatorError {
    /// Primary selector and every fallback failed
    #[error("Element not found: {strategy}:{value} (primary and {fallbacks} fallback selector(s) exhausted)")]
    ElementNotFound {
        strategy: SelectorStrategy,
        value: String,
        fallbacks: usize,
    },

    /// Healing oracle could not be reached or returned garbage
    #[error("Healing oracle failed: {0}")]
    OracleFailed(String),

    /// Oracle suggestion is unusable
    #[error("Invalid healing suggestion: {0}")]
    InvalidSuggestion(String),

    /// Page state needed for healing could not be captured
    #[error("Failed to capture page state: {0}")]
    CaptureFailed(String),
}

//! Core types for locator system

use action_primitives::{
    Command, CommandType, ElementHandle, FallbackSelector, SelectorSpec, SelectorStrategy,
};
use serde::{Deserialize, Serialize};

/// Element resolution result
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    /// Live element handle
    pub handle: ElementHandle,

    /// Strategy that matched
    pub strategy: SelectorStrategy,

    /// Selector value that matched
    pub value: String,

    /// Index into the fallback list, `None` when the primary matched
    pub fallback_index: Option<usize>,
}

impl ResolutionResult {
    /// Whether a fallback had to be used
    pub fn used_fallback(&self) -> bool {
        self.fallback_index.is_some()
    }
}

/// Everything the healing oracle gets to see
#[derive(Debug, Clone, Serialize)]
pub struct HealingContext {
    /// Selector that failed
    pub original_selector: SelectorSpec,

    /// Fallbacks already exhausted by the resolver
    pub tried_fallbacks: Vec<FallbackSelector>,

    /// Terminal error text of the failed attempts
    pub error_message: String,

    /// Current page URL
    pub page_url: String,

    /// DOM snapshot, possibly truncated
    pub dom_snapshot: String,

    /// Action the command was performing
    pub action_kind: CommandType,

    /// Natural-language description of the intended element
    pub element_description: String,
}

/// Selector as proposed by the oracle, strategy not yet validated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSelector {
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub value: String,
}

impl RawSelector {
    pub fn new(strategy: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            value: value.into(),
        }
    }
}

/// Unvalidated oracle response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHealingSuggestion {
    #[serde(alias = "primary_selector")]
    pub primary_selector: RawSelector,

    #[serde(default, alias = "fallback_selectors")]
    pub fallback_selectors: Vec<RawSelector>,

    #[serde(default)]
    pub confidence: f64,

    #[serde(default)]
    pub reasoning: String,
}

/// Validated oracle response
#[derive(Debug, Clone)]
pub struct HealingSuggestion {
    /// Replacement selector, fallbacks already filtered
    pub selector: SelectorSpec,

    /// Confidence clamped into `[0, 1]`
    pub confidence: f64,

    pub reasoning: String,

    /// Fallback entries dropped because their strategy was invalid
    pub dropped_fallbacks: usize,
}

/// Heal outcome enumeration
#[derive(Debug, Clone)]
pub enum HealOutcome {
    /// Oracle produced a usable replacement command
    Suggested {
        /// Command identical to the original except for its selector
        command: Command,

        suggestion: HealingSuggestion,
    },

    /// Healing not applicable to this failure
    Skipped {
        reason: String,
    },

    /// Healing was attempted but produced nothing usable
    Aborted {
        reason: String,
    },
}

impl HealOutcome {
    /// Check if heal produced a command
    pub fn is_suggested(&self) -> bool {
        matches!(self, HealOutcome::Suggested { .. })
    }

    /// Get healed command if any
    pub fn healed_command(&self) -> Option<&Command> {
        match self {
            HealOutcome::Suggested { command, .. } => Some(command),
            _ => None,
        }
    }

    /// Get confidence if any
    pub fn confidence(&self) -> Option<f64> {
        match self {
            HealOutcome::Suggested { suggestion, .. } => Some(suggestion.confidence),
            _ => None,
        }
    }
}

//! Selector specification for element targeting
//!
//! A selector spec carries a primary strategy/value pair plus an ordered
//! list of fallbacks. Resolution tries the primary first and then each
//! fallback in order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ActionError;

/// Locator strategy enumeration
///
/// The supported set is closed; anything else (for example a strategy
/// proposed by a healing oracle) must be parsed through [`FromStr`] and
/// rejected when unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorStrategy {
    /// CSS selector
    Css,

    /// Visible text content
    Text,

    /// ARIA role (optionally with accessible name)
    Role,

    /// XPath expression
    Xpath,

    /// `data-testid` attribute
    TestId,

    /// Input placeholder text
    Placeholder,
}

impl SelectorStrategy {
    /// Every supported strategy
    pub const ALL: [SelectorStrategy; 6] = [
        SelectorStrategy::Css,
        SelectorStrategy::Text,
        SelectorStrategy::Role,
        SelectorStrategy::Xpath,
        SelectorStrategy::TestId,
        SelectorStrategy::Placeholder,
    ];

    /// Get strategy name as string
    pub fn name(&self) -> &'static str {
        match self {
            SelectorStrategy::Css => "css",
            SelectorStrategy::Text => "text",
            SelectorStrategy::Role => "role",
            SelectorStrategy::Xpath => "xpath",
            SelectorStrategy::TestId => "testid",
            SelectorStrategy::Placeholder => "placeholder",
        }
    }
}

impl fmt::Display for SelectorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SelectorStrategy {
    type Err = ActionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', '_'], "");
        SelectorStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == normalized)
            .ok_or_else(|| ActionError::UnknownStrategy(raw.to_string()))
    }
}

/// Alternative strategy/value pair tried after the primary selector
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FallbackSelector {
    pub strategy: SelectorStrategy,
    pub value: String,
}

impl FallbackSelector {
    pub fn new(strategy: SelectorStrategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }
}

impl fmt::Display for FallbackSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.strategy, self.value)
    }
}

/// Provenance of a selector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectorMetadata {
    /// Confidence score (0.0-1.0)
    #[serde(default)]
    pub confidence: Option<f64>,

    /// Who produced the selector (planner, healer, recorder, ...)
    #[serde(default)]
    pub source: Option<String>,

    /// When the selector was produced
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

/// Primary selector plus ordered fallbacks
///
/// Equality only compares the primary strategy and value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorSpec {
    pub strategy: SelectorStrategy,
    pub value: String,
    #[serde(default)]
    pub fallbacks: Vec<FallbackSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SelectorMetadata>,
}

impl SelectorSpec {
    /// Create a selector with no fallbacks
    pub fn new(strategy: SelectorStrategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
            fallbacks: Vec::new(),
            metadata: None,
        }
    }

    /// Shorthand for a CSS selector
    pub fn css(value: impl Into<String>) -> Self {
        Self::new(SelectorStrategy::Css, value)
    }

    /// Append one fallback
    pub fn with_fallback(mut self, strategy: SelectorStrategy, value: impl Into<String>) -> Self {
        self.fallbacks.push(FallbackSelector::new(strategy, value));
        self
    }

    /// Replace the fallback list
    pub fn with_fallbacks(mut self, fallbacks: Vec<FallbackSelector>) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    /// Attach provenance metadata
    pub fn with_metadata(mut self, metadata: SelectorMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Primary followed by fallbacks, in resolution order
    pub fn candidates(&self) -> impl Iterator<Item = (SelectorStrategy, &str)> + '_ {
        std::iter::once((self.strategy, self.value.as_str())).chain(
            self.fallbacks
                .iter()
                .map(|fallback| (fallback.strategy, fallback.value.as_str())),
        )
    }

    /// Reject empty values in the primary or any fallback
    pub fn validate(&self) -> Result<(), ActionError> {
        if let Some((strategy, _)) = self.candidates().find(|(_, value)| value.trim().is_empty())
        {
            return Err(ActionError::InvalidSelector(format!(
                "empty {} selector value",
                strategy
            )));
        }
        Ok(())
    }
}

impl PartialEq for SelectorSpec {
    fn eq(&self, other: &Self) -> bool {
        self.strategy == other.strategy && self.value == other.value
    }
}

impl Eq for SelectorSpec {}

impl fmt::Display for SelectorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.strategy, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parse_accepts_aliases() {
        assert_eq!(
            "TestId".parse::<SelectorStrategy>().unwrap(),
            SelectorStrategy::TestId
        );
        assert_eq!(
            "test-id".parse::<SelectorStrategy>().unwrap(),
            SelectorStrategy::TestId
        );
        assert_eq!(
            " CSS ".parse::<SelectorStrategy>().unwrap(),
            SelectorStrategy::Css
        );
    }

    #[test]
    fn test_strategy_parse_rejects_unknown() {
        let err = "jquery".parse::<SelectorStrategy>().unwrap_err();
        assert_eq!(err, ActionError::UnknownStrategy("jquery".to_string()));
    }

    #[test]
    fn test_equality_ignores_fallbacks_and_metadata() {
        let a = SelectorSpec::css("#submit").with_fallback(SelectorStrategy::Text, "Submit");
        let b = SelectorSpec::css("#submit").with_metadata(SelectorMetadata {
            confidence: Some(0.4),
            source: Some("healer".into()),
            generated_at: None,
        });
        assert_eq!(a, b);
        assert_ne!(a, SelectorSpec::new(SelectorStrategy::Xpath, "#submit"));
    }

    #[test]
    fn test_candidates_keep_order() {
        let spec = SelectorSpec::css("#login")
            .with_fallback(SelectorStrategy::TestId, "login-btn")
            .with_fallback(SelectorStrategy::Text, "Log in");
        let order: Vec<_> = spec.candidates().map(|(s, _)| s).collect();
        assert_eq!(
            order,
            vec![
                SelectorStrategy::Css,
                SelectorStrategy::TestId,
                SelectorStrategy::Text
            ]
        );
    }

    #[test]
    fn test_validate_flags_empty_fallback() {
        let spec = SelectorSpec::css("#ok").with_fallback(SelectorStrategy::Role, "  ");
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_strategy_names() {
        let spec: SelectorSpec =
            serde_json::from_str(r#"{"strategy":"testid","value":"cart"}"#).unwrap();
        assert_eq!(spec.strategy, SelectorStrategy::TestId);
        assert!(spec.fallbacks.is_empty());
    }
}

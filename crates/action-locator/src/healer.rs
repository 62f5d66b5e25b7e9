//! Self-healing through an external oracle
//!
//! The oracle is asked once per failed command. Its answer is treated as
//! untrusted input: strategies are parsed against the supported set,
//! invalid fallbacks are dropped, and an invalid primary aborts healing.

use crate::{errors::LocatorError, types::*};
use action_primitives::{
    BrowserDriver, Command, FallbackSelector, SelectorMetadata, SelectorSpec, SelectorStrategy,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default cap on DOM snapshot size handed to the oracle
pub const DEFAULT_MAX_DOM_CHARS: usize = 20_000;

/// Source tag written into healed selector metadata
pub const HEALER_SOURCE: &str = "self-heal";

/// Healing oracle trait
///
/// Implementations may be nondeterministic and may return strategies
/// outside the supported set.
#[async_trait]
pub trait HealingOracle: Send + Sync {
    async fn suggest(&self, context: &HealingContext)
        -> Result<RawHealingSuggestion, LocatorError>;
}

/// Turn a raw oracle answer into a usable selector
pub fn validate_suggestion(raw: RawHealingSuggestion) -> Result<HealingSuggestion, LocatorError> {
    let strategy = raw
        .primary_selector
        .strategy
        .parse::<SelectorStrategy>()
        .map_err(|err| LocatorError::InvalidSuggestion(err.to_string()))?;
    let value = raw.primary_selector.value.trim();
    if value.is_empty() {
        return Err(LocatorError::InvalidSuggestion(
            "primary selector value is empty".to_string(),
        ));
    }

    let total = raw.fallback_selectors.len();
    let fallbacks: Vec<FallbackSelector> = raw
        .fallback_selectors
        .into_iter()
        .filter_map(|candidate| {
            let strategy = candidate.strategy.parse::<SelectorStrategy>().ok()?;
            let value = candidate.value.trim();
            (!value.is_empty()).then(|| FallbackSelector::new(strategy, value))
        })
        .collect();
    let dropped_fallbacks = total - fallbacks.len();
    if dropped_fallbacks > 0 {
        debug!("Dropped {} invalid fallback suggestion(s)", dropped_fallbacks);
    }

    let confidence = if raw.confidence.is_finite() {
        raw.confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let selector = SelectorSpec::new(strategy, value)
        .with_fallbacks(fallbacks)
        .with_metadata(SelectorMetadata {
            confidence: Some(confidence),
            source: Some(HEALER_SOURCE.to_string()),
            generated_at: Some(Utc::now()),
        });

    Ok(HealingSuggestion {
        selector,
        confidence,
        reasoning: raw.reasoning,
        dropped_fallbacks,
    })
}

/// Cut a DOM snapshot down to `max_chars` characters
pub fn truncate_dom(dom: &str, max_chars: usize) -> String {
    match dom.char_indices().nth(max_chars) {
        Some((byte_index, _)) => dom[..byte_index].to_string(),
        None => dom.to_string(),
    }
}

/// Builds healing requests and validates the answers
pub struct SelfHealer {
    oracle: Arc<dyn HealingOracle>,
    max_dom_chars: usize,
}

impl SelfHealer {
    pub fn new(oracle: Arc<dyn HealingOracle>) -> Self {
        Self {
            oracle,
            max_dom_chars: DEFAULT_MAX_DOM_CHARS,
        }
    }

    pub fn with_max_dom_chars(mut self, max_dom_chars: usize) -> Self {
        self.max_dom_chars = max_dom_chars;
        self
    }

    /// Capture page state and assemble the oracle input
    pub async fn build_context(
        &self,
        driver: &dyn BrowserDriver,
        command: &Command,
        selector: &SelectorSpec,
        error_message: &str,
    ) -> Result<HealingContext, LocatorError> {
        let dom = driver
            .dom_snapshot()
            .await
            .map_err(|err| LocatorError::CaptureFailed(err.to_string()))?;
        let page_url = driver
            .current_url()
            .await
            .map_err(|err| LocatorError::CaptureFailed(err.to_string()))?;

        Ok(HealingContext {
            original_selector: selector.clone(),
            tried_fallbacks: selector.fallbacks.clone(),
            error_message: error_message.to_string(),
            page_url,
            dom_snapshot: truncate_dom(&dom, self.max_dom_chars),
            action_kind: command.kind(),
            element_description: command.target_description(),
        })
    }

    /// Ask the oracle once for a replacement selector
    ///
    /// Never fails: every problem degrades to `Skipped` or `Aborted`.
    pub async fn heal(
        &self,
        driver: &dyn BrowserDriver,
        command: &Command,
        error_message: &str,
    ) -> HealOutcome {
        let Some(selector) = command.selector() else {
            return HealOutcome::Skipped {
                reason: format!("{} has no selector to heal", command.kind()),
            };
        };

        let context = match self
            .build_context(driver, command, selector, error_message)
            .await
        {
            Ok(context) => context,
            Err(err) => {
                warn!("Heal aborted while capturing page state: {}", err);
                return HealOutcome::Aborted {
                    reason: err.to_string(),
                };
            }
        };

        info!("Attempting self-heal for selector: {}", selector);
        let raw = match self.oracle.suggest(&context).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!("Healing oracle failed: {}", err);
                return HealOutcome::Aborted {
                    reason: err.to_string(),
                };
            }
        };

        match validate_suggestion(raw) {
            Ok(suggestion) => {
                info!(
                    "Oracle proposed {} (confidence: {:.2}, {} fallback(s))",
                    suggestion.selector,
                    suggestion.confidence,
                    suggestion.selector.fallbacks.len()
                );
                HealOutcome::Suggested {
                    command: command.with_selector(suggestion.selector.clone()),
                    suggestion,
                }
            }
            Err(err) => {
                warn!("Discarding oracle suggestion: {}", err);
                HealOutcome::Aborted {
                    reason: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::testing::ScriptedDriver;
    use action_primitives::CommandType;
    use std::sync::Mutex;

    struct FixedOracle {
        answer: Result<RawHealingSuggestion, LocatorError>,
        seen: Mutex<Vec<HealingContext>>,
    }

    impl FixedOracle {
        fn new(answer: Result<RawHealingSuggestion, LocatorError>) -> Self {
            Self {
                answer,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HealingOracle for FixedOracle {
        async fn suggest(
            &self,
            context: &HealingContext,
        ) -> Result<RawHealingSuggestion, LocatorError> {
            self.seen.lock().unwrap().push(context.clone());
            self.answer.clone()
        }
    }

    fn suggestion(primary: (&str, &str), fallbacks: &[(&str, &str)]) -> RawHealingSuggestion {
        RawHealingSuggestion {
            primary_selector: RawSelector::new(primary.0, primary.1),
            fallback_selectors: fallbacks
                .iter()
                .map(|(s, v)| RawSelector::new(*s, *v))
                .collect(),
            confidence: 0.8,
            reasoning: "button id changed".to_string(),
        }
    }

    #[test]
    fn test_validate_drops_invalid_fallbacks() {
        let raw = suggestion(
            ("testid", "submit"),
            &[("css", "#submit-v2"), ("jquery", "$('#x')"), ("text", "Submit")],
        );
        let validated = validate_suggestion(raw).unwrap();

        assert_eq!(validated.selector.strategy, SelectorStrategy::TestId);
        assert_eq!(validated.dropped_fallbacks, 1);
        let kept: Vec<_> = validated
            .selector
            .fallbacks
            .iter()
            .map(|f| f.strategy)
            .collect();
        assert_eq!(kept, vec![SelectorStrategy::Css, SelectorStrategy::Text]);
        assert_eq!(
            validated.selector.metadata.unwrap().source.as_deref(),
            Some(HEALER_SOURCE)
        );
    }

    #[test]
    fn test_validate_rejects_invalid_primary() {
        let err = validate_suggestion(suggestion(("sizzle", "#x"), &[("css", "#y")])).unwrap_err();
        assert!(matches!(err, LocatorError::InvalidSuggestion(_)));

        let empty = validate_suggestion(suggestion(("css", "  "), &[])).unwrap_err();
        assert!(matches!(empty, LocatorError::InvalidSuggestion(_)));
    }

    #[test]
    fn test_validate_clamps_confidence() {
        let mut raw = suggestion(("css", "#a"), &[]);
        raw.confidence = 7.5;
        assert_eq!(validate_suggestion(raw.clone()).unwrap().confidence, 1.0);
        raw.confidence = f64::NAN;
        assert_eq!(validate_suggestion(raw).unwrap().confidence, 0.0);
    }

    #[test]
    fn test_truncate_dom_respects_char_boundaries() {
        assert_eq!(truncate_dom("héllo", 2), "hé");
        assert_eq!(truncate_dom("abc", 10), "abc");
    }

    #[tokio::test]
    async fn test_heal_builds_full_context() {
        let driver = ScriptedDriver::new()
            .with_url("https://shop.test/cart")
            .with_dom("<button data-testid=\"checkout\">Checkout</button>");
        let oracle = Arc::new(FixedOracle::new(Ok(suggestion(
            ("testid", "checkout"),
            &[],
        ))));
        let healer = SelfHealer::new(oracle.clone()).with_max_dom_chars(10);
        let command = Command::click(
            SelectorSpec::css("#checkout").with_fallback(SelectorStrategy::Text, "Check out"),
        )
        .unwrap();

        let outcome = healer
            .heal(&driver, &command, "Element not found: css:#checkout")
            .await;

        let healed = outcome.healed_command().unwrap();
        assert_eq!(healed.kind(), CommandType::Click);
        assert_eq!(healed.selector().unwrap().value, "checkout");

        let seen = oracle.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let context = &seen[0];
        assert_eq!(context.page_url, "https://shop.test/cart");
        assert_eq!(context.dom_snapshot.chars().count(), 10);
        assert_eq!(context.tried_fallbacks.len(), 1);
        assert_eq!(context.action_kind, CommandType::Click);
        assert!(context.error_message.contains("not found"));
        assert!(context.element_description.contains("css:#checkout"));
    }

    #[tokio::test]
    async fn test_heal_aborts_on_oracle_error() {
        let driver = ScriptedDriver::new();
        let oracle = Arc::new(FixedOracle::new(Err(LocatorError::OracleFailed(
            "rate limited".to_string(),
        ))));
        let healer = SelfHealer::new(oracle);
        let command = Command::click(SelectorSpec::css("#x")).unwrap();

        let outcome = healer.heal(&driver, &command, "not found").await;
        assert!(matches!(outcome, HealOutcome::Aborted { reason } if reason.contains("rate limited")));
    }

    #[tokio::test]
    async fn test_heal_skips_commands_without_selector() {
        let driver = ScriptedDriver::new();
        let oracle = Arc::new(FixedOracle::new(Ok(suggestion(("css", "#a"), &[]))));
        let healer = SelfHealer::new(oracle.clone());
        let command = Command::navigate("https://example.com").unwrap();

        let outcome = healer.heal(&driver, &command, "timeout").await;
        assert!(matches!(outcome, HealOutcome::Skipped { .. }));
        assert!(oracle.seen.lock().unwrap().is_empty());
    }
}

//! Heuristic failure classification
//!
//! Driver and locator errors arrive as free text, so the category is picked
//! by keyword. Selector keywords win over timeout keywords: "timeout waiting
//! for selector" is a resolution problem.

use action_primitives::FailureCategory;

const SELECTOR_KEYWORDS: &[&str] = &[
    "not found",
    "selector",
    "no such element",
    "unable to locate",
    "no element",
    "not attached",
];
const TIMEOUT_KEYWORDS: &[&str] = &["timeout", "timed out", "exceeded"];
const ASSERTION_KEYWORDS: &[&str] = &["assert", "expected", "mismatch", "to equal", "to contain"];
const NAVIGATION_KEYWORDS: &[&str] = &[
    "navigation",
    "navigate",
    "net::err",
    "err_name_not_resolved",
    "page crashed",
    "dns",
];

/// Map an error message onto a failure category
pub fn classify_failure(message: &str) -> FailureCategory {
    let lower = message.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|keyword| lower.contains(keyword));

    if mentions(SELECTOR_KEYWORDS) {
        FailureCategory::SelectorNotFound
    } else if mentions(TIMEOUT_KEYWORDS) {
        FailureCategory::Timeout
    } else if mentions(ASSERTION_KEYWORDS) {
        FailureCategory::AssertionMismatch
    } else if mentions(NAVIGATION_KEYWORDS) {
        FailureCategory::NavigationError
    } else {
        FailureCategory::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_messages() {
        assert_eq!(
            classify_failure("Element not found: css:#submit"),
            FailureCategory::SelectorNotFound
        );
        assert_eq!(
            classify_failure("waiting for selector `#a` failed: timeout 2000ms exceeded"),
            FailureCategory::SelectorNotFound
        );
    }

    #[test]
    fn test_timeout_messages() {
        assert_eq!(
            classify_failure("Timeout exceeded: 30000ms"),
            FailureCategory::Timeout
        );
        assert_eq!(
            classify_failure("operation timed out"),
            FailureCategory::Timeout
        );
    }

    #[test]
    fn test_assertion_and_navigation_messages() {
        assert_eq!(
            classify_failure("Assertion failed: expected 'Welcome' got 'Login'"),
            FailureCategory::AssertionMismatch
        );
        assert_eq!(
            classify_failure("Navigation failed: net::ERR_CONNECTION_REFUSED"),
            FailureCategory::NavigationError
        );
    }

    #[test]
    fn test_unknown_fallback() {
        assert_eq!(
            classify_failure("browser process exited"),
            FailureCategory::Unknown
        );
        assert_eq!(classify_failure(""), FailureCategory::Unknown);
    }
}

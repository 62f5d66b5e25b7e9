//! Element resolver with fallback chain orchestration

use crate::{errors::LocatorError, types::*};
use action_primitives::{BrowserDriver, SelectorSpec, SelectorStrategy};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Default bounded wait for an element to become attached
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_millis(2_000);

/// Element resolver trait
#[async_trait]
pub trait ElementResolver: Send + Sync {
    /// Resolve the primary selector, falling back through the chain in order
    async fn resolve(&self, spec: &SelectorSpec) -> Result<ResolutionResult, LocatorError>;
}

/// Default element resolver implementation
///
/// Performs no retries beyond the fallback chain; retrying over time is the
/// executor's job.
pub struct DefaultElementResolver {
    driver: Arc<dyn BrowserDriver>,
    timeout: Duration,
}

impl DefaultElementResolver {
    /// Create a resolver with the default bounded wait
    pub fn new(driver: Arc<dyn BrowserDriver>) -> Self {
        Self::with_timeout(driver, DEFAULT_RESOLVE_TIMEOUT)
    }

    pub fn with_timeout(driver: Arc<dyn BrowserDriver>, timeout: Duration) -> Self {
        Self { driver, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// One bounded locate call; a driver that ignores the bound is cut off here
    async fn try_strategy(
        &self,
        strategy: SelectorStrategy,
        value: &str,
    ) -> Option<action_primitives::ElementHandle> {
        match timeout(self.timeout, self.driver.locate(strategy, value, self.timeout)).await {
            Ok(Ok(handle)) => Some(handle),
            Ok(Err(err)) => {
                debug!(%strategy, value, error = %err, "locate failed");
                None
            }
            Err(_) => {
                debug!(%strategy, value, timeout_ms = self.timeout.as_millis() as u64, "locate timed out");
                None
            }
        }
    }
}

#[async_trait]
impl ElementResolver for DefaultElementResolver {
    async fn resolve(&self, spec: &SelectorSpec) -> Result<ResolutionResult, LocatorError> {
        debug!("Resolving element: {}", spec);

        for (index, (strategy, value)) in spec.candidates().enumerate() {
            if let Some(handle) = self.try_strategy(strategy, value).await {
                let fallback_index = index.checked_sub(1);
                if fallback_index.is_some() {
                    info!(
                        "Resolved {} through fallback {}:{} (#{})",
                        spec, strategy, value, index
                    );
                }
                return Ok(ResolutionResult {
                    handle,
                    strategy,
                    value: value.to_string(),
                    fallback_index,
                });
            }
        }

        warn!(
            "All strategies exhausted for {} ({} fallbacks)",
            spec,
            spec.fallbacks.len()
        );
        Err(LocatorError::ElementNotFound {
            strategy: spec.strategy,
            value: spec.value.clone(),
            fallbacks: spec.fallbacks.len(),
        })
    }
}

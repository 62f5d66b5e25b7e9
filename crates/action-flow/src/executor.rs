//! Command executor implementation

use crate::classify::classify_failure;
use crate::errors::FlowError;
use crate::observer::{ExecutionEvent, ExecutionObserver, NoopObserver};
use crate::strategies::RetryPolicy;
use crate::types::ExecutorConfig;
use action_locator::{
    DefaultElementResolver, ElementResolver, HealOutcome, HealingOracle, SelfHealer,
};
use action_primitives::{
    BrowserDriver, Command, CommandType, ExecutionResult, FailureCategory, FailureContext,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// `wait` parameter holding a fixed pause in milliseconds
pub const PARAM_WAIT_MS: &str = "ms";

/// Command executor trait
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute one command; failures are reported in the result, never raised
    async fn execute(&self, command: &Command) -> ExecutionResult;

    /// Execute commands in order, stopping after the first failure
    ///
    /// The returned list ends with the failing command's result.
    async fn execute_all(&self, commands: &[Command]) -> Vec<ExecutionResult> {
        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            let result = self.execute(command).await;
            let failed = !result.success;
            results.push(result);
            if failed {
                debug!("Stopping command sequence after failed {}", command);
                break;
            }
        }
        results
    }
}

/// Default command executor implementation
///
/// Each command gets up to `max_attempts` tries with the original selector,
/// a fixed delay in between. After exhausted resolution failures the healing
/// oracle is consulted once and its command is executed once.
pub struct DefaultCommandExecutor {
    driver: Arc<dyn BrowserDriver>,
    resolver: Arc<dyn ElementResolver>,
    healer: Option<SelfHealer>,
    policy: RetryPolicy,
    config: ExecutorConfig,
    observer: Arc<dyn ExecutionObserver>,
    cancel: CancellationToken,
}

impl DefaultCommandExecutor {
    /// Create an executor without healing
    pub fn new(driver: Arc<dyn BrowserDriver>, config: ExecutorConfig) -> Self {
        let resolver = Arc::new(DefaultElementResolver::with_timeout(
            driver.clone(),
            config.resolve_timeout(),
        ));
        Self {
            driver,
            resolver,
            healer: None,
            policy: RetryPolicy::from_config(&config),
            config,
            observer: Arc::new(NoopObserver),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ElementResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Enable self-healing through `oracle`
    pub fn with_oracle(mut self, oracle: Arc<dyn HealingOracle>) -> Self {
        self.healer = Some(SelfHealer::new(oracle).with_max_dom_chars(self.config.max_dom_chars));
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Single attempt: resolve the target (if any) and perform the action
    async fn run_once(&self, command: &Command) -> Result<(), FlowError> {
        if command.kind() == CommandType::Wait {
            if let Some(ms) = command
                .param(PARAM_WAIT_MS)
                .and_then(|raw| raw.trim().parse::<u64>().ok())
            {
                return self.pause(Duration::from_millis(ms)).await;
            }
        }

        let handle = match command.selector() {
            Some(spec) => Some(self.resolver.resolve(spec).await?.handle),
            None => None,
        };
        self.driver
            .perform(command.kind(), handle.as_ref(), command.params())
            .await?;
        Ok(())
    }

    /// Sleep for `delay` unless cancelled first
    async fn pause(&self, delay: Duration) -> Result<(), FlowError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(FlowError::Cancelled),
            _ = sleep(delay) => Ok(()),
        }
    }

    /// Attempt loop with the original selector; returns attempts made
    async fn attempt_with_retries(&self, command: &Command) -> (u32, Result<(), FlowError>) {
        let mut attempt = 0;
        loop {
            if self.cancel.is_cancelled() {
                return (attempt, Err(FlowError::Cancelled));
            }
            attempt += 1;

            let err = match self.run_once(command).await {
                Ok(()) => return (attempt, Ok(())),
                Err(FlowError::Cancelled) => return (attempt, Err(FlowError::Cancelled)),
                Err(err) => err,
            };

            warn!(
                "Attempt {}/{} of {} failed: {}",
                attempt,
                self.policy.max_attempts(),
                command,
                err
            );
            self.observer.on_event(&ExecutionEvent::AttemptFailed {
                command: command.to_string(),
                attempt,
                max_attempts: self.policy.max_attempts(),
                error: err.to_string(),
            });

            if !err.is_retryable() {
                debug!("{} is not retryable, giving up after attempt {}", command, attempt);
                return (attempt, Err(err));
            }
            if !self.policy.should_retry(attempt) {
                return (attempt, Err(err));
            }

            let delay = self.policy.delay_after(attempt);
            self.observer.on_event(&ExecutionEvent::RetryScheduled {
                command: command.to_string(),
                next_attempt: attempt + 1,
                delay_ms: delay.as_millis() as u64,
            });
            if let Err(cancelled) = self.pause(delay).await {
                return (attempt, Err(cancelled));
            }
        }
    }

    /// One-shot healing; returns the healed command when it succeeded
    async fn try_heal(
        &self,
        command: &Command,
        category: FailureCategory,
        message: &str,
    ) -> Option<Command> {
        let healer = self.healer.as_ref()?;
        if !self.config.self_heal
            || command.selector().is_none()
            || !category.is_resolution_problem()
            || self.cancel.is_cancelled()
        {
            return None;
        }

        self.observer.on_event(&ExecutionEvent::HealRequested {
            command: command.to_string(),
            category,
        });

        match healer.heal(self.driver.as_ref(), command, message).await {
            HealOutcome::Suggested {
                command: healed,
                suggestion,
            } => match self.run_once(&healed).await {
                Ok(()) => {
                    info!("Self-heal succeeded for {} using {}", command, suggestion.selector);
                    self.observer.on_event(&ExecutionEvent::Healed {
                        command: command.to_string(),
                        selector: suggestion.selector.to_string(),
                        confidence: suggestion.confidence,
                    });
                    Some(healed)
                }
                Err(err) => {
                    warn!("Healed {} failed as well: {}", healed, err);
                    self.observer.on_event(&ExecutionEvent::HealFailed {
                        command: command.to_string(),
                        reason: err.to_string(),
                    });
                    None
                }
            },
            HealOutcome::Skipped { reason } | HealOutcome::Aborted { reason } => {
                debug!("No healed command for {}: {}", command, reason);
                self.observer.on_event(&ExecutionEvent::HealFailed {
                    command: command.to_string(),
                    reason,
                });
                None
            }
        }
    }

    /// Best-effort diagnostics; capture problems never mask the original error
    async fn capture_failure(
        &self,
        category: FailureCategory,
        message: &str,
        attempts: u32,
    ) -> FailureContext {
        let url = match self.driver.current_url().await {
            Ok(url) => Some(url),
            Err(err) => {
                debug!("Could not read page URL for diagnostics: {}", err);
                None
            }
        };

        let screenshot = if self.config.capture_screenshot_on_failure {
            match self.driver.screenshot().await {
                Ok(png) => Some(STANDARD.encode(png)),
                Err(err) => {
                    debug!("Could not capture screenshot: {}", err);
                    None
                }
            }
        } else {
            None
        };

        FailureContext {
            category,
            message: message.to_string(),
            url,
            screenshot,
            attempts,
            captured_at: Utc::now(),
        }
    }
}

#[async_trait]
impl CommandExecutor for DefaultCommandExecutor {
    async fn execute(&self, command: &Command) -> ExecutionResult {
        let started = Instant::now();
        debug!("Executing command: {}", command);

        let (attempts, outcome) = self.attempt_with_retries(command).await;
        let error = match outcome {
            Ok(()) => return ExecutionResult::success(started.elapsed(), attempts),
            Err(FlowError::Cancelled) => {
                info!("Command {} cancelled after {} attempt(s)", command, attempts);
                self.observer.on_event(&ExecutionEvent::Cancelled {
                    command: command.to_string(),
                });
                return ExecutionResult::failure(
                    FlowError::Cancelled.to_string(),
                    started.elapsed(),
                    attempts,
                );
            }
            Err(err) => err,
        };

        let message = error.to_string();
        let category = classify_failure(&message);

        if let Some(healed) = self.try_heal(command, category, &message).await {
            return ExecutionResult::success(started.elapsed(), attempts).with_refined(healed);
        }

        let context = self.capture_failure(category, &message, attempts).await;
        ExecutionResult::failure(message, started.elapsed(), attempts).with_failure_context(context)
    }
}

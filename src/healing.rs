//! OpenAI-compatible healing oracle
//!
//! Only transport and parsing live here. Strategy validation of the answer
//! happens in the locator crate, so this adapter passes strategies through as
//! plain strings.

use std::env;
use std::time::Duration;

use action_locator::{HealingContext, HealingOracle, LocatorError, RawHealingSuggestion};
use action_primitives::SelectorStrategy;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::HealingConfig;

pub struct OpenAiHealingOracle {
    client: Client,
    config: HealingConfig,
    api_key: String,
}

impl OpenAiHealingOracle {
    pub fn new(config: HealingConfig, api_key: impl Into<String>) -> Result<Self, LocatorError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LocatorError::OracleFailed(
                "missing API key for healing oracle".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| {
                LocatorError::OracleFailed(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// Read the API key from the configured environment variable
    pub fn from_env(config: HealingConfig) -> Result<Self, LocatorError> {
        let api_key = env::var(&config.api_key_env).map_err(|_| {
            LocatorError::OracleFailed(format!(
                "environment variable {} is not set",
                config.api_key_env
            ))
        })?;
        Self::new(config, api_key)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl HealingOracle for OpenAiHealingOracle {
    async fn suggest(
        &self,
        context: &HealingContext,
    ) -> Result<RawHealingSuggestion, LocatorError> {
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            response_format: ResponseFormat {
                r#type: "json_object".to_string(),
            },
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_user_prompt(context),
                },
            ],
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| LocatorError::OracleFailed(format!("healing request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            warn!(target: "healing", %status, "healing oracle returned an error");
            return Err(LocatorError::OracleFailed(format!(
                "healing oracle returned {status}: {text}"
            )));
        }

        let response: ChatCompletionResponse = response.json().await.map_err(|err| {
            LocatorError::OracleFailed(format!("healing response invalid: {err}"))
        })?;
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LocatorError::OracleFailed("healing response missing content".into()))?;
        debug!(target: "healing", chars = content.len(), "healing oracle replied");

        parse_suggestion(&content)
    }
}

/// Extract and decode the JSON object inside an oracle reply
pub fn parse_suggestion(content: &str) -> Result<RawHealingSuggestion, LocatorError> {
    let json = extract_json_object(content).ok_or_else(|| {
        LocatorError::InvalidSuggestion("healing reply contains no JSON object".to_string())
    })?;
    serde_json::from_str(&json).map_err(|err| {
        LocatorError::InvalidSuggestion(format!("failed to parse healing JSON: {err}"))
    })
}

/// Find a JSON object in free text: bare, fenced, or embedded in prose
pub fn extract_json_object(raw: &str) -> Option<String> {
    let fence = "```";
    if !raw.trim_start().starts_with('{') {
        if let Some(start) = raw.find(fence) {
            let after_fence = &raw[start + fence.len()..];
            let body = after_fence.trim_start_matches(|c: char| c.is_alphanumeric() || c == '_');
            if let Some(end) = body.find(fence) {
                if let Some(object) = balanced_object(&body[..end]) {
                    return Some(object);
                }
            }
        }
    }
    balanced_object(raw)
}

/// First balanced `{...}` span, ignoring braces inside string literals
fn balanced_object(text: &str) -> Option<String> {
    let open = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in text[open..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[open..=open + idx].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn system_prompt() -> String {
    let strategies = SelectorStrategy::ALL
        .iter()
        .map(SelectorStrategy::name)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You repair broken element selectors for browser tests. \
         Given a failed selector, the page URL and a DOM snapshot, propose a replacement. \
         Allowed strategies: {strategies}. \
         Reply with a single JSON object: \
         {{\"primarySelector\":{{\"strategy\":\"...\",\"value\":\"...\"}},\
         \"fallbackSelectors\":[{{\"strategy\":\"...\",\"value\":\"...\"}}],\
         \"confidence\":0.0,\"reasoning\":\"...\"}}"
    )
}

fn build_user_prompt(context: &HealingContext) -> String {
    let tried = context
        .tried_fallbacks
        .iter()
        .map(|fallback| format!("- {fallback}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Action: {action}\nTarget: {description}\nFailed selector: {selector}\n\
         Fallbacks already tried:\n{tried}\nError: {error}\nPage URL: {url}\n\
         DOM snapshot:\n{dom}",
        action = context.action_kind,
        description = context.element_description,
        selector = context.original_selector,
        tried = if tried.is_empty() { "- none".to_string() } else { tried },
        error = context.error_message,
        url = context.page_url,
        dom = context.dom_snapshot,
    )
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

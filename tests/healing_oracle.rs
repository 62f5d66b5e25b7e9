use std::sync::{Arc, Mutex};

use action_locator::{HealingContext, HealingOracle, LocatorError};
use action_primitives::testing::ScriptedDriver;
use action_primitives::{BrowserDriver, CommandType, SelectorSpec, SelectorStrategy};
use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use soultest_cli::{
    HealingConfig, OpenAiHealingOracle, RunnerConfig, SessionFactory, TestPlan, TestRunner,
};
use soultest_core_types::SessionId;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Captured {
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn spawn_stub(reply: Value, status: StatusCode) -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route(
            "/v1/chat/completions",
            post(
                move |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| {
                    let reply = reply.clone();
                    async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|value| value.to_str().ok())
                            .map(str::to_string);
                        captured.requests.lock().unwrap().push((auth, body));
                        (status, Json(reply))
                    }
                },
            ),
        )
        .with_state(captured.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/v1"), captured)
}

fn completion(content: &str) -> Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
}

fn context() -> HealingContext {
    HealingContext {
        original_selector: SelectorSpec::css("#checkout"),
        tried_fallbacks: Vec::new(),
        error_message: "Element not found: css:#checkout".to_string(),
        page_url: "https://shop.test/cart".to_string(),
        dom_snapshot: "<button data-testid=\"checkout\">Checkout</button>".to_string(),
        action_kind: CommandType::Click,
        element_description: "the checkout button".to_string(),
    }
}

fn oracle(api_base: String) -> OpenAiHealingOracle {
    let config = HealingConfig {
        api_base,
        model: "stub-model".to_string(),
        timeout_ms: 5_000,
        ..HealingConfig::default()
    };
    OpenAiHealingOracle::new(config, "sk-test").unwrap()
}

#[tokio::test]
async fn suggestion_round_trip_through_stub_server() {
    let content = "```json\n{\"primarySelector\":{\"strategy\":\"testid\",\"value\":\"checkout\"},\"fallbackSelectors\":[{\"strategy\":\"text\",\"value\":\"Checkout\"}],\"confidence\":0.92,\"reasoning\":\"id removed\"}\n```";
    let (base, captured) = spawn_stub(completion(content), StatusCode::OK).await;

    let raw = oracle(base).suggest(&context()).await.unwrap();

    assert_eq!(raw.primary_selector.strategy, "testid");
    assert_eq!(raw.primary_selector.value, "checkout");
    assert_eq!(raw.fallback_selectors.len(), 1);
    assert!((raw.confidence - 0.92).abs() < f64::EPSILON);

    let validated = action_locator::validate_suggestion(raw).unwrap();
    assert_eq!(validated.selector.strategy, SelectorStrategy::TestId);

    let requests = captured.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "stub-model");
    assert_eq!(body["response_format"]["type"], "json_object");
    let user = body["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("css:#checkout"));
    assert!(user.contains("https://shop.test/cart"));
}

#[tokio::test]
async fn server_error_becomes_oracle_failure() {
    let (base, _) = spawn_stub(json!({"error": "overloaded"}), StatusCode::SERVICE_UNAVAILABLE).await;

    let err = oracle(base).suggest(&context()).await.unwrap_err();
    assert!(matches!(err, LocatorError::OracleFailed(message) if message.contains("503")));
}

#[tokio::test]
async fn prose_reply_is_an_invalid_suggestion() {
    let (base, _) = spawn_stub(completion("I could not find the element."), StatusCode::OK).await;

    let err = oracle(base).suggest(&context()).await.unwrap_err();
    assert!(matches!(err, LocatorError::InvalidSuggestion(_)));
}

struct RenamedButtonSessions;

#[async_trait]
impl SessionFactory for RenamedButtonSessions {
    async fn open(&self, _session: &SessionId) -> anyhow::Result<Arc<dyn BrowserDriver>> {
        Ok(Arc::new(
            ScriptedDriver::new().attach(SelectorStrategy::TestId, "place-order"),
        ))
    }
}

const ORDER_PLAN: &str = r##"
name: order
subtasks:
  - id: order
    commands:
      - { type: click, selector: { strategy: css, value: "#submit-order" } }
"##;

#[tokio::test]
async fn healing_section_enables_oracle_from_env() {
    let content = "{\"primarySelector\":{\"strategy\":\"testid\",\"value\":\"place-order\"},\"confidence\":0.8,\"reasoning\":\"renamed\"}";
    let (base, captured) = spawn_stub(completion(content), StatusCode::OK).await;
    std::env::set_var("SOULTEST_HEALING_KEY_CONFIGURED", "sk-from-env");

    let mut config = RunnerConfig::default();
    config.executor.max_attempts = 1;
    config.healing = Some(HealingConfig {
        api_base: base,
        api_key_env: "SOULTEST_HEALING_KEY_CONFIGURED".to_string(),
        timeout_ms: 5_000,
        ..HealingConfig::default()
    });
    let runner = TestRunner::new(Arc::new(RenamedButtonSessions), &config).unwrap();

    let summary = runner.run(TestPlan::parse(ORDER_PLAN).unwrap()).await.unwrap();

    assert!(summary.success);
    assert_eq!(summary.healed_commands, 1);
    let requests = captured.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0.as_deref(), Some("Bearer sk-from-env"));
}

#[test]
fn healing_section_without_key_is_rejected() {
    let config = RunnerConfig {
        healing: Some(HealingConfig {
            api_key_env: "SOULTEST_HEALING_KEY_NEVER_SET".to_string(),
            ..HealingConfig::default()
        }),
        ..RunnerConfig::default()
    };

    let err = TestRunner::new(Arc::new(RenamedButtonSessions), &config)
        .err()
        .unwrap();
    assert!(format!("{err:#}").contains("SOULTEST_HEALING_KEY_NEVER_SET"));
}

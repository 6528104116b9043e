//! End-to-end gateway behavior against mock backends

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_providers::*;
use completion_gateway::{
    BackendArgs, BackendError, CompletionRequest, GatewayError, GatewaySettings, Message,
};
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};

#[derive(Debug, Deserialize, PartialEq)]
struct Answer {
    answer: i64,
}

#[derive(Debug, Deserialize, PartialEq)]
struct WeatherArgs {
    city: String,
}

#[tokio::test]
async fn test_unexpected_tool_name_exhausts_retries() {
    let mock = MockOpenAI::new().await;
    mock.mock_tool_call("other", &json!({})).await;
    let gateway = gateway_builder("gpt-4o", openai_env(&mock)).build().unwrap();

    let err = gateway.complete(&weather_request()).await.unwrap_err();

    match err {
        GatewayError::RetriesExhausted { attempts, source } => {
            assert_eq!(attempts, 3);
            assert_eq!(source, BackendError::contract("unexpected tool name: other"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(mock.request_bodies().await.len(), 3);
}

#[tokio::test]
async fn test_recovers_from_server_errors() {
    let mock = MockOpenAI::new().await;
    mock.mock_flaky(2, "finally").await;
    let gateway = gateway_builder("gpt-4o", openai_env(&mock)).build().unwrap();

    let result = gateway.complete(&simple_request("Hi")).await.unwrap();
    assert_eq!(result.as_text(), Some("finally"));
    assert_eq!(mock.request_bodies().await.len(), 3);
}

#[tokio::test]
async fn test_anthropic_rejects_tools() {
    let mock = MockAnthropic::new().await;
    mock.mock_messages("unused").await;
    let gateway = gateway_builder("claude-3-opus", anthropic_env(&mock))
        .build()
        .unwrap();

    let err = gateway.complete(&weather_request()).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidRequest { .. }));
    assert!(mock.request_bodies().await.is_empty());
}

#[tokio::test]
async fn test_complete_as_struct() {
    let mock = MockAnthropic::new().await;
    mock.mock_messages("```\n{\"answer\": 4}\n```").await;
    let gateway = gateway_builder("claude-sonnet-4-5", anthropic_env(&mock))
        .build()
        .unwrap();

    let answer: Answer = gateway.complete_as(&arithmetic_request()).await.unwrap();
    assert_eq!(answer, Answer { answer: 4 });
}

#[tokio::test]
async fn test_complete_as_tool_arguments() {
    let mock = MockOpenAI::new().await;
    mock.mock_tool_call("get_weather", &json!({"city": "Paris"})).await;
    let gateway = gateway_builder("gpt-4o", openai_env(&mock)).build().unwrap();

    let args: WeatherArgs = gateway.complete_as(&weather_request()).await.unwrap();
    assert_eq!(args.city, "Paris");
}

#[tokio::test]
async fn test_gpt_argument_merging() {
    let mock = MockOpenAI::new().await;
    mock.mock_chat_completion("ok").await;
    let gateway = gateway_builder("gpt-4o-mini", openai_env(&mock))
        .default_args(
            BackendArgs::new()
                .with("max_tokens", 512)
                .with("temperature", 0.2)
                .with("seed", 7),
        )
        .build()
        .unwrap();
    let request = CompletionRequest::builder()
        .message(Message::user("Hi"))
        .arg("temperature", 0.9)
        .arg("messages", json!([]))
        .build()
        .unwrap();

    gateway.complete(&request).await.unwrap();

    let body = &mock.request_bodies().await[0];
    assert!(body.get("max_tokens").is_none());
    assert_eq!(body["temperature"], 0.9);
    assert_eq!(body["seed"], 7);
    assert_eq!(body["messages"][0]["content"], "Hi");
}

#[tokio::test]
async fn test_settings_from_toml() {
    let mock = MockOpenAI::new().await;
    mock.mock_chat_completion("ok").await;
    let settings = GatewaySettings::from_toml_str(
        r#"
        max_concurrency = 2

        [retry]
        max_attempts = 2
        initial_delay = "5ms"
        max_delay = "5ms"

        [default_args]
        top_p = 0.5
        "#,
    )
    .unwrap();
    let gateway = completion_gateway::Gateway::builder("gpt-4o")
        .env(openai_env(&mock))
        .settings(settings)
        .build()
        .unwrap();
    assert_eq!(gateway.max_concurrency(), 2);
    assert_eq!(gateway.retry_policy().max_attempts(), 2);

    gateway.complete(&simple_request("Hi")).await.unwrap();
    assert_eq!(mock.request_bodies().await[0]["top_p"], 0.5);
}

#[tokio::test]
async fn test_concurrency_limit_bounds_in_flight_requests() {
    let mock = MockOpenAI::new().await;
    mock.mock_chat_completion_delayed("slow", Duration::from_millis(200))
        .await;
    let gateway = gateway_builder("gpt-4o", openai_env(&mock))
        .max_concurrency(2)
        .build()
        .unwrap();
    let request = simple_request("Hi");

    let start = Instant::now();
    let (a, b, c, d) = tokio::join!(
        gateway.complete(&request),
        gateway.complete(&request),
        gateway.complete(&request),
        gateway.complete(&request),
    );
    let elapsed = start.elapsed();

    for result in [a, b, c, d] {
        assert_eq!(result.unwrap().as_text(), Some("slow"));
    }
    // Two waves of two
    assert!(elapsed >= Duration::from_millis(400), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn test_dropped_call_releases_permit() {
    let mock = MockOpenAI::new().await;
    mock.mock_chat_completion_delayed("slow", Duration::from_secs(30))
        .await;
    let gateway = gateway_builder("gpt-4o", openai_env(&mock))
        .max_concurrency(1)
        .build()
        .unwrap();
    let request = simple_request("Hi");

    let abandoned =
        tokio::time::timeout(Duration::from_millis(200), gateway.complete(&request)).await;
    assert!(abandoned.is_err());
    assert_eq!(gateway.in_flight(), 0);
}

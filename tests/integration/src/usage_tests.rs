//! Usage and timing reporting through the metrics sinks

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_providers::*;
use completion_gateway::{FanoutSink, PrometheusSink, UsageMonitor};
use std::sync::Arc;

#[tokio::test]
async fn test_usage_record_per_call() {
    let mock = MockOpenAI::new().await;
    mock.mock_chat_completion(r#"{"answer": 4}"#).await;
    let monitor = Arc::new(UsageMonitor::new());
    let gateway = gateway_builder("gpt-4o", openai_env(&mock))
        .metrics(monitor.clone())
        .build()
        .unwrap();

    gateway.complete(&arithmetic_request()).await.unwrap();
    gateway.complete(&simple_request("Hi")).await.unwrap();

    let records = monitor.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].metric_key, "arithmetic");
    assert_eq!(records[0].model_id, "openai:gpt-4o");
    assert_eq!(
        (records[0].prompt_tokens, records[0].completion_tokens),
        OPENAI_USAGE
    );
    assert_eq!(records[1].metric_key, "general");

    assert_eq!(monitor.latency("lm/arithmetic").unwrap().count, 1);
    assert_eq!(monitor.latency("lm/general").unwrap().count, 1);
}

#[tokio::test]
async fn test_undecodable_replies_are_still_recorded() {
    let mock = MockAnthropic::new().await;
    mock.mock_messages("not json at all").await;
    let monitor = Arc::new(UsageMonitor::new());
    let gateway = gateway_builder("claude-3-haiku", anthropic_env(&mock))
        .metrics(monitor.clone())
        .build()
        .unwrap();

    assert!(gateway.complete(&arithmetic_request()).await.is_err());

    let totals = monitor
        .token_totals("arithmetic", "anthropic:claude-3-haiku")
        .unwrap();
    assert_eq!(totals.calls, 3);
    assert_eq!(totals.prompt_tokens, 3 * u64::from(ANTHROPIC_USAGE.0));
    assert_eq!(totals.completion_tokens, 3 * u64::from(ANTHROPIC_USAGE.1));
}

#[tokio::test]
async fn test_transport_failures_are_not_recorded() {
    let mock = MockOpenAI::new().await;
    mock.mock_error(503, "overloaded").await;
    let monitor = Arc::new(UsageMonitor::new());
    let gateway = gateway_builder("gpt-4o", openai_env(&mock))
        .metrics(monitor.clone())
        .build()
        .unwrap();

    assert!(gateway.complete(&simple_request("Hi")).await.is_err());
    assert!(monitor.snapshot().records.is_empty());
    assert!(monitor.latency("lm/general").is_none());
}

#[tokio::test]
async fn test_prometheus_and_monitor_together() {
    let mock = MockAnthropic::new().await;
    mock.mock_messages("hello").await;
    let monitor = Arc::new(UsageMonitor::new());
    let prometheus = Arc::new(PrometheusSink::new().unwrap());
    let sink = FanoutSink::new()
        .with_sink(monitor.clone())
        .with_sink(prometheus.clone());
    let gateway = gateway_builder("claude-3-haiku", anthropic_env(&mock))
        .metrics(Arc::new(sink))
        .build()
        .unwrap();

    gateway.complete(&simple_request("Hi")).await.unwrap();

    assert_eq!(monitor.snapshot().total_tokens(), 40);
    let text = prometheus.export().unwrap();
    assert!(text.contains(
        "lm_prompt_tokens_total{key=\"general\",model=\"anthropic:claude-3-haiku\"} 25"
    ));
    assert!(text.contains("lm_request_duration_seconds_count{key=\"lm/general\"} 1"));
}

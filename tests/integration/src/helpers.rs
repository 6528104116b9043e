//! Test helper utilities for integration tests

use completion_gateway::{Gateway, GatewayBuilder, GatewayEnv, RetryPolicy};
use std::sync::Once;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::mock_providers::{MockAnthropic, MockOpenAI};

static TRACING: Once = Once::new();

/// Initialize tracing for tests when `TEST_LOG` is set
pub fn init_tracing() {
    TRACING.call_once(|| {
        if std::env::var("TEST_LOG").is_ok() {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        }
    });
}

/// Retry policy with millisecond backoff so real-time tests stay fast
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::builder()
        .max_attempts(max_attempts)
        .initial_delay(Duration::from_millis(10))
        .max_delay(Duration::from_millis(20))
        .build()
}

/// Environment routing OpenAI models to `mock`
pub fn openai_env(mock: &MockOpenAI) -> GatewayEnv {
    GatewayEnv::default()
        .with_var("OPENAI_API_KEY", "sk-test")
        .with_var("OPENAI_BASE_URL", mock.base_url())
}

/// Environment routing Claude models to `mock`
pub fn anthropic_env(mock: &MockAnthropic) -> GatewayEnv {
    GatewayEnv::default()
        .with_var("ANTHROPIC_API_KEY", "sk-ant-test")
        .with_var("ANTHROPIC_BASE_URL", mock.base_url())
}

/// Builder for `model` resolved through `env`, with fast retries
pub fn gateway_builder(model: &str, env: GatewayEnv) -> GatewayBuilder {
    init_tracing();
    Gateway::builder(model)
        .env(env)
        .retry_policy(fast_retry(3))
}

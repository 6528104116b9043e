//! # Completion Gateway
//!
//! A single entry point for issuing chat completions against hosted model
//! backends. The gateway resolves the backend family from the model name,
//! normalizes the conversation, enforces structured output and mandatory
//! tool calls, bounds concurrency, retries with exponential backoff and
//! reports usage to a metrics sink.
//!
//! ```no_run
//! use completion_gateway::{CompletionRequest, Gateway, Message};
//!
//! # async fn run() -> Result<(), completion_gateway::GatewayError> {
//! let gateway = Gateway::builder("gpt-4o").max_concurrency(4).build()?;
//!
//! let request = CompletionRequest::builder()
//!     .message(Message::user("What is 2 + 2? Answer in JSON."))
//!     .json_object()
//!     .metric_key("arithmetic")
//!     .build()?;
//!
//! let result = gateway.complete(&request).await?;
//! println!("{result:?}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod gateway;

pub use gateway::{Gateway, GatewayBuilder, RESERVED_ARGS};

pub use gateway_config::{
    resolve_backend, BackendTarget, ConfigError, GatewayEnv, GatewaySettings, RetrySettings,
};
pub use gateway_core::{
    BackendAdapter, BackendArgs, BackendError, BackendFamily, CompletionRequest,
    CompletionRequestBuilder, CompletionResult, ContentPart, Conversation, GatewayError,
    GatewayResult, ImageAttachment, JsonSchemaFormat, Message, MetricsSink, NoopSink, OutputMode,
    RawReply, RawToolCall, Role, TokenUsage, ToolSpec, DEFAULT_METRIC_KEY,
};
pub use gateway_providers::create_adapter;
pub use gateway_resilience::{ConcurrencyGate, RetryConfig, RetryPolicy};
pub use gateway_telemetry::{
    init_logging, FanoutSink, LogFormat, LoggingConfig, PrometheusSink, UsageMonitor,
    UsageSnapshot,
};

//! # Gateway Core
//!
//! Core types, traits, and error handling for the completion gateway.
//!
//! This crate provides the foundational types used throughout the gateway:
//! - Conversation, request and result types
//! - The backend adapter trait
//! - The metrics sink trait
//! - Error types and handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod metrics;
pub mod provider;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use error::{BackendError, GatewayError, GatewayResult};
pub use metrics::{MetricsSink, NoopSink};
pub use provider::{BackendAdapter, BackendFamily};
pub use request::{
    BackendArgs, CompletionRequest, CompletionRequestBuilder, ContentPart, Conversation,
    ImageAttachment, JsonSchemaFormat, Message, OutputMode, Role, ToolSpec, DEFAULT_METRIC_KEY,
};
pub use response::{CompletionResult, RawReply, RawToolCall, TokenUsage};

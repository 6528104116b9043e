//! Anthropic messages adapter.
//!
//! System text travels in the top-level `system` field. Structured output is
//! requested through a schema directive in that field, and the reply is
//! parsed after stripping any Markdown code fence.

use crate::normalize::{anthropic_messages, AnthropicMessage};
use async_trait::async_trait;
use gateway_core::{
    BackendAdapter, BackendArgs, BackendError, BackendFamily, CompletionRequest, CompletionResult,
    GatewayError, RawReply, TokenUsage,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// Anthropic API version header value
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default generation cap
pub const DEFAULT_MAX_TOKENS: u32 = 32_768;

/// Anthropic adapter configuration
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// Model name
    pub model: String,
    /// API base
    pub base_url: Url,
    /// API key
    pub api_key: SecretString,
    /// Request timeout
    pub timeout: Duration,
    /// `max_tokens` sent when the caller gives none
    pub default_max_tokens: u32,
}

impl AnthropicConfig {
    /// Create a new Anthropic configuration
    #[must_use]
    pub fn new(model: impl Into<String>, base_url: Url, api_key: SecretString) -> Self {
        Self {
            model: model.into(),
            base_url,
            api_key,
            timeout: Duration::from_secs(600),
            default_max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the default `max_tokens`
    #[must_use]
    pub fn with_default_max_tokens(mut self, max_tokens: u32) -> Self {
        self.default_max_tokens = max_tokens;
        self
    }

    /// Messages endpoint URL
    #[must_use]
    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.as_str().trim_end_matches('/'))
    }
}

/// Anthropic backend adapter
pub struct AnthropicAdapter {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicAdapter {
    /// Create a new adapter
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created
    pub fn new(config: AnthropicConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn transform_request(
        &self,
        request: &CompletionRequest,
        args: &BackendArgs,
    ) -> Result<MessagesRequest<'_>, BackendError> {
        let (system, messages) =
            anthropic_messages(&request.conversation, request.output_mode.schema())?;

        let mut args = args.clone();
        let max_tokens = args
            .remove("max_tokens")
            .and_then(|value| value.as_u64())
            .map_or(self.config.default_max_tokens, |value| {
                u32::try_from(value).unwrap_or(u32::MAX)
            });

        Ok(MessagesRequest {
            model: &self.config.model,
            messages,
            max_tokens,
            system,
            args,
        })
    }
}

/// Extract the JSON payload from a reply that may be wrapped in a code fence
///
/// Takes the text after the first ```` ```json ```` marker (or, failing
/// that, the first ```` ``` ````) up to the next fence.
#[must_use]
pub fn strip_code_fence(content: &str) -> &str {
    let inner = if let Some((_, rest)) = content.split_once("```json") {
        rest.split("```").next().unwrap_or(rest)
    } else if let Some((_, rest)) = content.split_once("```") {
        rest.split("```").next().unwrap_or(rest)
    } else {
        content
    };
    inner.trim()
}

#[async_trait]
impl BackendAdapter for AnthropicAdapter {
    fn family(&self) -> BackendFamily {
        BackendFamily::Anthropic
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn issue_call(
        &self,
        request: &CompletionRequest,
        args: &BackendArgs,
    ) -> Result<RawReply, BackendError> {
        let body = self.transform_request(request, args)?;
        let url = self.config.messages_url();

        debug!(
            model = %self.config.model,
            url = %url,
            messages = body.messages.len(),
            max_tokens = body.max_tokens,
            "Sending messages request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.config.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::transport(None, format!("Request failed: {e}")))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            BackendError::transport(Some(status.as_u16()), format!("Failed to read body: {e}"))
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(BackendError::transport(Some(status.as_u16()), message));
        }

        trace!(body = %text, "Messages reply");

        let reply: MessagesResponse = serde_json::from_str(&text)
            .map_err(|e| BackendError::contract(format!("Failed to parse response: {e}")))?;

        let content = reply
            .content
            .into_iter()
            .find_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            });

        Ok(RawReply {
            content,
            tool_calls: Vec::new(),
            usage: TokenUsage::new(reply.usage.input_tokens, reply.usage.output_tokens),
        })
    }

    fn decode_result(
        &self,
        request: &CompletionRequest,
        reply: RawReply,
    ) -> Result<CompletionResult, BackendError> {
        let content = reply
            .content
            .ok_or_else(|| BackendError::contract("reply has no text content"))?;

        if request.output_mode.expects_json() {
            let value: Value = serde_json::from_str(strip_code_fence(&content))
                .map_err(|e| BackendError::contract(format!("reply is not valid JSON: {e}")))?;
            Ok(CompletionResult::Json { value })
        } else {
            Ok(CompletionResult::Text { text: content })
        }
    }
}

// ============================================================================
// Anthropic API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(flatten)]
    args: BackendArgs,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    usage: ResponseUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

// ============================================================================
// Tests
// ============================================================================

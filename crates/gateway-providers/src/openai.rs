//! OpenAI-style chat completions adapter.
//!
//! Speaks the chat-completions protocol for three endpoint variants:
//! - Standard OpenAI: `{base}/chat/completions` with a Bearer key
//! - Local OpenAI-compatible servers (vLLM and similar): same shape, placeholder key
//! - Azure OpenAI: `{endpoint}/openai/deployments/{model}/chat/completions?api-version=..`
//!   with the key in an `api-key` header

use crate::normalize::{openai_messages, OpenAIMessage};
use async_trait::async_trait;
use gateway_core::{
    BackendAdapter, BackendArgs, BackendError, BackendFamily, CompletionRequest, CompletionResult,
    GatewayError, OutputMode, RawReply, RawToolCall, TokenUsage, ToolSpec,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// How the adapter authenticates
#[derive(Debug, Clone)]
pub enum OpenAIAuth {
    /// `Authorization: Bearer <key>`
    Bearer(SecretString),
    /// `api-key: <key>` (Azure)
    ApiKeyHeader(SecretString),
}

/// OpenAI-style adapter configuration
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Model (or Azure deployment) name
    pub model: String,
    /// Full chat-completions URL
    pub completions_url: String,
    /// Credential
    pub auth: OpenAIAuth,
    /// Request timeout
    pub timeout: Duration,
}

impl OpenAIConfig {
    /// Configuration for a standard or compatible endpoint at `base_url`
    #[must_use]
    pub fn new(model: impl Into<String>, base_url: &Url, api_key: SecretString) -> Self {
        Self {
            model: model.into(),
            completions_url: format!("{}/chat/completions", base_url.as_str().trim_end_matches('/')),
            auth: OpenAIAuth::Bearer(api_key),
            timeout: Duration::from_secs(600),
        }
    }

    /// Configuration for an Azure OpenAI deployment
    ///
    /// `endpoint` is either the resource root or a full chat-completions URL.
    #[must_use]
    pub fn azure(
        model: impl Into<String>,
        endpoint: &Url,
        api_key: SecretString,
        api_version: &str,
    ) -> Self {
        let model = model.into();
        let root = endpoint.as_str().trim_end_matches('/');
        let completions_url = if endpoint.path().contains("/chat/completions") {
            format!("{root}?api-version={api_version}")
        } else {
            format!("{root}/openai/deployments/{model}/chat/completions?api-version={api_version}")
        };

        Self {
            model,
            completions_url,
            auth: OpenAIAuth::ApiKeyHeader(api_key),
            timeout: Duration::from_secs(600),
        }
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// OpenAI-style backend adapter
pub struct OpenAIAdapter {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIAdapter {
    /// Create a new adapter
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created
    pub fn new(config: OpenAIConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// The chat-completions URL requests go to
    #[must_use]
    pub fn completions_url(&self) -> &str {
        &self.config.completions_url
    }

    /// Build the wire request body
    fn transform_request<'a>(
        &'a self,
        request: &'a CompletionRequest,
        args: &'a BackendArgs,
    ) -> Result<ChatCompletionRequest<'a>, BackendError> {
        let response_format = match &request.output_mode {
            OutputMode::FreeText => json!({"type": "text"}),
            OutputMode::JsonObject => json!({"type": "json_object"}),
            OutputMode::JsonSchema(format) => json!({"type": "json_schema", "json_schema": format}),
        };

        let tools = request
            .tools
            .as_ref()
            .filter(|tools| !tools.is_empty())
            .map(|tools| tools.iter().map(WireTool::function).collect::<Vec<_>>());
        let forced = tools.is_some();

        Ok(ChatCompletionRequest {
            model: &self.config.model,
            messages: openai_messages(&request.conversation)?,
            response_format,
            tools,
            tool_choice: forced.then_some("required"),
            parallel_tool_calls: forced.then_some(false),
            args,
        })
    }
}

/// Map a non-success reply to a transport error
fn status_error(status: reqwest::StatusCode, body: &str) -> BackendError {
    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    BackendError::transport(Some(status.as_u16()), message)
}

#[async_trait]
impl BackendAdapter for OpenAIAdapter {
    fn family(&self) -> BackendFamily {
        BackendFamily::OpenAI
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

        debug!(
            model = %self.config.model,
            url = %self.config.completions_url,
            messages = body.messages.len(),
            tools = request.tool_names().len(),
            "Sending chat completion request"
        );

        let builder = self.client.post(&self.config.completions_url).json(&body);
        let builder = match &self.config.auth {
            OpenAIAuth::Bearer(key) => builder.bearer_auth(key.expose_secret()),
            OpenAIAuth::ApiKeyHeader(key) => builder.header("api-key", key.expose_secret()),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| BackendError::transport(None, format!("Request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::transport(Some(status.as_u16()), format!("Failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        trace!(body = %text, "Chat completion reply");

        let reply: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| BackendError::contract(format!("Failed to parse response: {e}")))?;

        let usage = reply
            .usage
            .ok_or_else(|| BackendError::contract("response has no usage"))?;
        let message = reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::contract("response has no choices"))?
            .message;

        Ok(RawReply {
            content: message.content,
            tool_calls: message
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|call| RawToolCall {
                    name: call.function.name,
                    arguments: call.function.arguments,
                })
                .collect(),
            usage: TokenUsage::new(usage.prompt_tokens, usage.completion_tokens),
        })
    }

    fn decode_result(
        &self,
        request: &CompletionRequest,
        reply: RawReply,
    ) -> Result<CompletionResult, BackendError> {
        if request.requires_tool_call() {
            let call = reply
                .tool_calls
                .into_iter()
                .next()
                .ok_or_else(|| BackendError::contract("tool list provided, but no tool call was made"))?;

            if !request.tool_names().contains(&call.name.as_str()) {
                return Err(BackendError::contract(format!(
                    "unexpected tool name: {}",
                    call.name
                )));
            }

            let arguments: Value = serde_json::from_str(&call.arguments).map_err(|e| {
                BackendError::contract(format!("tool call arguments are not valid JSON: {e}"))
            })?;

            return Ok(CompletionResult::ToolCall {
                name: call.name,
                arguments,
            });
        }

        let content = reply
            .content
            .ok_or_else(|| BackendError::contract("reply content was empty"))?;

        if request.output_mode.expects_json() {
            let value = serde_json::from_str(&content)
                .map_err(|e| BackendError::contract(format!("reply is not valid JSON: {e}")))?;
            Ok(CompletionResult::Json { value })
        } else {
            Ok(CompletionResult::Text { text: content })
        }
    }
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
    response_format: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parallel_tool_calls: Option<bool>,
    #[serde(flatten)]
    args: &'a BackendArgs,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: WireFunction<'a>,
}

impl<'a> WireTool<'a> {
    fn function(tool: &'a ToolSpec) -> Self {
        Self {
            tool_type: "function",
            function: WireFunction {
                name: &tool.name,
                description: (!tool.description.is_empty()).then_some(tool.description.as_str()),
                parameters: &tool.parameters,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    parameters: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ResponseChoice>,
    #[serde(default)]
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    function: ResponseFunctionCall,
}

#[derive(Debug, Deserialize)]
struct ResponseFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
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

//! Mock backends for integration testing
//!
//! Wiremock servers speaking the OpenAI chat-completions and Anthropic
//! messages protocols.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path of the chat-completions endpoint under an OpenAI-style base URL
pub const OPENAI_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Path of the messages endpoint
pub const ANTHROPIC_MESSAGES_PATH: &str = "/v1/messages";

/// Mock OpenAI API server
pub struct MockOpenAI {
    pub server: MockServer,
}

impl MockOpenAI {
    /// Create a new mock OpenAI server
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL as configured through `OPENAI_BASE_URL`
    pub fn base_url(&self) -> String {
        format!("{}/v1", self.server.uri())
    }

    /// Server root, without the API prefix
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Reply with text content on every call
    pub async fn mock_chat_completion(&self, content: &str) {
        self.mount(ResponseTemplate::new(200).set_body_json(openai_chat_response(content)))
            .await;
    }

    /// Reply with text content after a delay
    pub async fn mock_chat_completion_delayed(&self, content: &str, delay: Duration) {
        self.mount(
            ResponseTemplate::new(200)
                .set_body_json(openai_chat_response(content))
                .set_delay(delay),
        )
        .await;
    }

    /// Reply with a single tool call on every call
    pub async fn mock_tool_call(&self, name: &str, arguments: &Value) {
        self.mount(
            ResponseTemplate::new(200).set_body_json(openai_tool_call_response(name, arguments)),
        )
        .await;
    }

    /// Reply with an API error on every call
    pub async fn mock_error(&self, status: u16, message: &str) {
        self.mount(ResponseTemplate::new(status).set_body_json(api_error_response(message)))
            .await;
    }

    /// Fail `fail_count` times with a server error, then reply with `content`
    pub async fn mock_flaky(&self, fail_count: u64, content: &str) {
        Mock::given(method("POST"))
            .and(path(OPENAI_COMPLETIONS_PATH))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(api_error_response("server overloaded")),
            )
            .up_to_n_times(fail_count)
            .with_priority(1)
            .mount(&self.server)
            .await;
        self.mock_chat_completion(content).await;
    }

    /// Bodies of every request received so far
    pub async fn request_bodies(&self) -> Vec<Value> {
        received_bodies(&self.server).await
    }

    async fn mount(&self, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(OPENAI_COMPLETIONS_PATH))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }
}

/// Mock Anthropic API server
pub struct MockAnthropic {
    pub server: MockServer,
}

impl MockAnthropic {
    /// Create a new mock Anthropic server
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL as configured through `ANTHROPIC_BASE_URL`
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Reply with a single text block on every call
    pub async fn mock_messages(&self, text: &str) {
        Mock::given(method("POST"))
            .and(path(ANTHROPIC_MESSAGES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_message_response(text)))
            .mount(&self.server)
            .await;
    }

    /// Reply with an API error on every call
    pub async fn mock_error(&self, status: u16, message: &str) {
        Mock::given(method("POST"))
            .and(path(ANTHROPIC_MESSAGES_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_json(api_error_response(message)))
            .mount(&self.server)
            .await;
    }

    /// Bodies of every request received so far
    pub async fn request_bodies(&self) -> Vec<Value> {
        received_bodies(&self.server).await
    }
}

async fn received_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.body_json::<Value>().expect("request body is JSON"))
        .collect()
}

// ============================================================================
// Response builders
// ============================================================================

/// Usage reported by every mock OpenAI reply
pub const OPENAI_USAGE: (u32, u32) = (12, 8);

/// Usage reported by every mock Anthropic reply
pub const ANTHROPIC_USAGE: (u32, u32) = (25, 15);

/// Chat-completions reply carrying `content`
pub fn openai_chat_response(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "mock",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": OPENAI_USAGE.0,
            "completion_tokens": OPENAI_USAGE.1,
            "total_tokens": OPENAI_USAGE.0 + OPENAI_USAGE.1
        }
    })
}

/// Chat-completions reply carrying one tool call
pub fn openai_tool_call_response(name: &str, arguments: &Value) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "mock",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": name, "arguments": arguments.to_string()}
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": {
            "prompt_tokens": OPENAI_USAGE.0,
            "completion_tokens": OPENAI_USAGE.1,
            "total_tokens": OPENAI_USAGE.0 + OPENAI_USAGE.1
        }
    })
}

/// Messages reply carrying one text block
pub fn anthropic_message_response(text: &str) -> Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "model": "mock",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {
            "input_tokens": ANTHROPIC_USAGE.0,
            "output_tokens": ANTHROPIC_USAGE.1
        }
    })
}

/// Error body shared by both protocols
pub fn api_error_response(message: &str) -> Value {
    json!({
        "error": {
            "type": "api_error",
            "message": message
        }
    })
}

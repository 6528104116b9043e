//! Result types for the gateway.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Normalized completion result
///
/// Exactly one variant is produced, matching the request's output mode and tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompletionResult {
    /// Free text reply
    Text {
        /// The reply text
        text: String,
    },
    /// Decoded JSON reply
    Json {
        /// The decoded value
        value: Value,
    },
    /// The tool the backend selected
    ToolCall {
        /// Tool name (always one of the requested tools)
        name: String,
        /// Decoded arguments
        arguments: Value,
    },
}

impl CompletionResult {
    /// Text of a `Text` result
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Value of a `Json` result
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json { value } => Some(value),
            _ => None,
        }
    }

    /// Name and arguments of a `ToolCall` result
    #[must_use]
    pub fn as_tool_call(&self) -> Option<(&str, &Value)> {
        match self {
            Self::ToolCall { name, arguments } => Some((name, arguments)),
            _ => None,
        }
    }

    /// Consume a `Json` result into its value
    #[must_use]
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json { value } => Some(value),
            _ => None,
        }
    }
}

/// Token usage reported by a backend for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt (input) tokens
    pub prompt_tokens: u32,
    /// Completion (output) tokens
    pub completion_tokens: u32,
}

impl TokenUsage {
    /// Create a usage figure
    #[must_use]
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    /// Sum of prompt and completion tokens
    #[must_use]
    pub fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// A tool invocation as it came off the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToolCall {
    /// Function name
    pub name: String,
    /// Arguments, still JSON-encoded
    pub arguments: String,
}

/// An undecoded backend reply
///
/// Produced by [`crate::BackendAdapter::issue_call`] once the network round
/// trip succeeded; contract checks happen in
/// [`crate::BackendAdapter::decode_result`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawReply {
    /// Reply text, if the backend returned any
    pub content: Option<String>,
    /// Tool invocations, in the order the backend returned them
    pub tool_calls: Vec<RawToolCall>,
    /// Token usage for the call
    pub usage: TokenUsage,
}

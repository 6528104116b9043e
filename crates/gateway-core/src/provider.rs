//! Backend adapter abstraction.
//!
//! Each backend family (wire protocol) implements [`BackendAdapter`]. The
//! gateway calls `issue_call` once per attempt and `decode_result` on the
//! raw reply; both fail with a retryable [`BackendError`].

use crate::error::BackendError;
use crate::request::{BackendArgs, CompletionRequest};
use crate::response::{CompletionResult, RawReply};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend family (wire protocol)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendFamily {
    /// Chat-completions style API (OpenAI, Azure OpenAI, vLLM and other compatibles)
    OpenAI,
    /// Messages style API (Anthropic)
    Anthropic,
}

impl BackendFamily {
    /// Prefix used in usage records (`"<family>:<model>"`)
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Model identifier as recorded in usage records
    #[must_use]
    pub fn usage_model_id(self, model: &str) -> String {
        format!("{}:{model}", self.as_str())
    }

    /// Whether this family can enforce a mandatory tool call
    #[must_use]
    pub fn supports_forced_tools(self) -> bool {
        matches!(self, Self::OpenAI)
    }
}

impl fmt::Display for BackendFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One backend family's network call and reply decoding
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// The backend family this adapter speaks
    fn family(&self) -> BackendFamily;

    /// Model identifier sent to the backend
    fn model(&self) -> &str;

    /// Perform exactly one network round trip
    ///
    /// `args` are the already-merged backend arguments for this call.
    async fn issue_call(
        &self,
        request: &CompletionRequest,
        args: &BackendArgs,
    ) -> Result<RawReply, BackendError>;

    /// Interpret a raw reply according to the request's contract
    fn decode_result(
        &self,
        request: &CompletionRequest,
        reply: RawReply,
    ) -> Result<CompletionResult, BackendError>;
}

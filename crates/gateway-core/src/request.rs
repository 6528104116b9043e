//! Request types for the gateway.
//!
//! A [`CompletionRequest`] is backend-agnostic: a conversation of role-tagged
//! messages, an output contract, optional tools, and pass-through arguments.
//! Backend adapters shape it into their own wire format.

use crate::error::GatewayError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Metric key used when the caller does not supply one
pub const DEFAULT_METRIC_KEY: &str = "general";

/// Ordered chat history
pub type Conversation = Vec<Message>;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction
    System,
    /// User turn
    User,
    /// Assistant turn
    Assistant,
}

impl Role {
    /// Wire name of the role
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An in-memory image attached to a message
///
/// Cloning is cheap; the bitmap is shared.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    bitmap: Arc<DynamicImage>,
}

impl ImageAttachment {
    /// Wrap a decoded bitmap
    #[must_use]
    pub fn new(bitmap: DynamicImage) -> Self {
        Self {
            bitmap: Arc::new(bitmap),
        }
    }

    /// Decode an image from encoded bytes (PNG or JPEG)
    ///
    /// # Errors
    /// Returns error if the bytes are not a supported image
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GatewayError> {
        image::load_from_memory(bytes)
            .map(Self::new)
            .map_err(|e| GatewayError::invalid_request(format!("unreadable image: {e}")))
    }

    /// The underlying bitmap
    #[must_use]
    pub fn bitmap(&self) -> &DynamicImage {
        &self.bitmap
    }
}

impl From<DynamicImage> for ImageAttachment {
    fn from(bitmap: DynamicImage) -> Self {
        Self::new(bitmap)
    }
}

/// One part of a message's content
#[derive(Debug, Clone)]
pub enum ContentPart {
    /// Plain text
    Text(String),
    /// Image attachment
    Image(ImageAttachment),
}

/// A role-tagged message
#[derive(Debug, Clone)]
pub struct Message {
    /// Author role
    pub role: Role,
    /// Ordered content parts
    pub content: Vec<ContentPart>,
}

impl Message {
    /// Create a message with a single text part
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentPart::Text(text.into())],
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    /// Create a user message
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// Append a text part
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content.push(ContentPart::Text(text.into()));
        self
    }

    /// Append an image part
    #[must_use]
    pub fn with_image(mut self, image: impl Into<ImageAttachment>) -> Self {
        self.content.push(ContentPart::Image(image.into()));
        self
    }

    /// All text parts joined by newlines
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text(text) => Some(text.as_str()),
                ContentPart::Image(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether any part is an image
    #[must_use]
    pub fn has_images(&self) -> bool {
        self.content
            .iter()
            .any(|part| matches!(part, ContentPart::Image(_)))
    }
}

/// A named JSON schema for structured output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchemaFormat {
    /// Schema name
    pub name: String,
    /// The JSON Schema document
    pub schema: Value,
    /// Strict schema adherence, where the backend supports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl JsonSchemaFormat {
    /// Create a schema format
    #[must_use]
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
            strict: None,
        }
    }

    /// Request strict adherence
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }
}

/// Output contract of a request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OutputMode {
    /// Free text reply
    #[default]
    FreeText,
    /// Any JSON object
    JsonObject,
    /// JSON matching a schema
    JsonSchema(JsonSchemaFormat),
}

impl OutputMode {
    /// Whether the reply must be decoded as JSON
    #[must_use]
    pub fn expects_json(&self) -> bool {
        !matches!(self, Self::FreeText)
    }

    /// The schema, when one was requested
    #[must_use]
    pub fn schema(&self) -> Option<&JsonSchemaFormat> {
        match self {
            Self::JsonSchema(format) => Some(format),
            _ => None,
        }
    }
}

/// A callable tool the backend may be required to invoke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Function name
    pub name: String,
    /// Function description
    #[serde(default)]
    pub description: String,
    /// Parameter JSON Schema
    #[serde(default = "empty_object_schema")]
    pub parameters: Value,
}

fn empty_object_schema() -> Value {
    serde_json::json!({"type": "object", "properties": {}})
}

impl ToolSpec {
    /// Create a tool with no parameters
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: empty_object_schema(),
        }
    }

    /// Set the parameter schema
    #[must_use]
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Render the tool as a human-readable description
    ///
    /// Used when a tool list has to be presented to a model as prompt text.
    #[must_use]
    pub fn describe(&self) -> String {
        let properties = self
            .parameters
            .get("properties")
            .and_then(Value::as_object)
            .filter(|props| !props.is_empty());

        let arg_names = properties
            .map(|props| props.keys().cloned().collect::<Vec<_>>().join(", "))
            .unwrap_or_default();

        let mut out = format!("Function: {}({arg_names})\n\n", self.name);

        if !self.description.is_empty() {
            out.push_str("Description:\n");
            out.push_str(&self.description);
            out.push_str("\n\n");
        }

        if let Some(props) = properties {
            out.push_str("Parameters:\n");
            for (name, param) in props {
                out.push_str("- ");
                out.push_str(name);
                if let Some(desc) = param.get("description").and_then(Value::as_str) {
                    out.push_str(": ");
                    out.push_str(desc);
                }
                out.push('\n');
            }
            out.push_str("\n\n");
        }

        out
    }
}

/// Backend arguments passed through verbatim (temperature, max_tokens, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendArgs(Map<String, Value>);

impl BackendArgs {
    /// Create an empty argument map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an argument
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Remove an argument
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Look up an argument
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether the key is present
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of arguments
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no arguments
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over arguments
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Overlay `overrides` on top of `self`; keys in `overrides` win
    #[must_use]
    pub fn merged_with(&self, overrides: &Self) -> Self {
        let mut merged = self.0.clone();
        for (key, value) in &overrides.0 {
            merged.insert(key.clone(), value.clone());
        }
        Self(merged)
    }

    /// Consume into the underlying JSON map
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for BackendArgs {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for BackendArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Backend-agnostic completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Chat history
    pub conversation: Conversation,
    /// Output contract
    pub output_mode: OutputMode,
    /// Tools the backend must choose exactly one of
    pub tools: Option<Vec<ToolSpec>>,
    /// Pass-through backend arguments
    pub backend_args: BackendArgs,
    /// Label for usage and timing records
    pub metric_key: String,
}

impl CompletionRequest {
    /// Create a new builder
    #[must_use]
    pub fn builder() -> CompletionRequestBuilder {
        CompletionRequestBuilder::default()
    }

    /// Names of the requested tools (empty when no tools)
    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools
            .iter()
            .flatten()
            .map(|tool| tool.name.as_str())
            .collect()
    }

    /// Whether a mandatory tool call was requested
    #[must_use]
    pub fn requires_tool_call(&self) -> bool {
        self.tools.as_ref().is_some_and(|tools| !tools.is_empty())
    }

    /// Validate the request invariants
    ///
    /// # Errors
    /// Returns [`GatewayError::InvalidRequest`] if any invariant is violated
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.conversation.is_empty() {
            return Err(GatewayError::invalid_request("conversation cannot be empty"));
        }

        if self.metric_key.is_empty() {
            return Err(GatewayError::invalid_request("metric_key cannot be empty"));
        }

        if let Some(tools) = &self.tools {
            if tools.is_empty() {
                return Err(GatewayError::invalid_request(
                    "tools must be non-empty when provided",
                ));
            }

            if self.output_mode.expects_json() {
                return Err(GatewayError::invalid_request(
                    "tools and JSON output mode are mutually exclusive",
                ));
            }

            let mut seen = HashSet::new();
            for tool in tools {
                if tool.name.is_empty() {
                    return Err(GatewayError::invalid_request("tool name cannot be empty"));
                }
                if !seen.insert(tool.name.as_str()) {
                    return Err(GatewayError::invalid_request(format!(
                        "duplicate tool name '{}'",
                        tool.name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Builder for [`CompletionRequest`]
#[derive(Debug, Default)]
pub struct CompletionRequestBuilder {
    conversation: Conversation,
    output_mode: OutputMode,
    tools: Option<Vec<ToolSpec>>,
    backend_args: BackendArgs,
    metric_key: Option<String>,
}

impl CompletionRequestBuilder {
    /// Set the whole conversation
    #[must_use]
    pub fn conversation(mut self, conversation: Conversation) -> Self {
        self.conversation = conversation;
        self
    }

    /// Append a message
    #[must_use]
    pub fn message(mut self, message: Message) -> Self {
        self.conversation.push(message);
        self
    }

    /// Set the output mode
    #[must_use]
    pub fn output_mode(mut self, output_mode: OutputMode) -> Self {
        self.output_mode = output_mode;
        self
    }

    /// Request JSON output matching a schema
    #[must_use]
    pub fn json_schema(self, name: impl Into<String>, schema: Value) -> Self {
        self.output_mode(OutputMode::JsonSchema(JsonSchemaFormat::new(name, schema)))
    }

    /// Request any JSON object
    #[must_use]
    pub fn json_object(self) -> Self {
        self.output_mode(OutputMode::JsonObject)
    }

    /// Add a tool
    #[must_use]
    pub fn tool(mut self, tool: ToolSpec) -> Self {
        self.tools.get_or_insert_with(Vec::new).push(tool);
        self
    }

    /// Set the tool list
    #[must_use]
    pub fn tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set one backend argument
    #[must_use]
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.backend_args.insert(key, value);
        self
    }

    /// Set all backend arguments
    #[must_use]
    pub fn backend_args(mut self, args: BackendArgs) -> Self {
        self.backend_args = args;
        self
    }

    /// Set the metric key
    #[must_use]
    pub fn metric_key(mut self, key: impl Into<String>) -> Self {
        self.metric_key = Some(key.into());
        self
    }

    /// Build and validate the request
    ///
    /// # Errors
    /// Returns error if the request violates an invariant
    pub fn build(self) -> Result<CompletionRequest, GatewayError> {
        let request = CompletionRequest {
            conversation: self.conversation,
            output_mode: self.output_mode,
            tools: self.tools,
            backend_args: self.backend_args,
            metric_key: self
                .metric_key
                .unwrap_or_else(|| DEFAULT_METRIC_KEY.to_string()),
        };

        request.validate()?;

        Ok(request)
    }
}

//! Conversation normalization.
//!
//! Converts a [`Conversation`] into each family's wire message shape. A
//! message made of a single text part is sent as a plain string; anything
//! else becomes a list of content parts with images encoded inline.

use crate::encoding::{png_base64, png_data_url, PNG_MEDIA_TYPE};
use gateway_core::{BackendError, ContentPart, Conversation, JsonSchemaFormat, Message, Role};
use serde::Serialize;
use tracing::warn;

/// Image detail level requested from OpenAI-style backends
const IMAGE_DETAIL: &str = "high";

/// OpenAI-style chat message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAIMessage {
    /// `system`, `user` or `assistant`
    pub role: &'static str,
    /// Message content
    pub content: OpenAIContent,
}

/// OpenAI-style message content
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OpenAIContent {
    /// Plain text
    Text(String),
    /// Mixed content parts
    Parts(Vec<OpenAIContentPart>),
}

/// OpenAI-style content part
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpenAIContentPart {
    /// Text part
    Text {
        /// Text
        text: String,
    },
    /// Inline image part
    ImageUrl {
        /// Image reference
        image_url: OpenAIImageUrl,
    },
}

/// OpenAI-style image reference
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAIImageUrl {
    /// `data:` URL
    pub url: String,
    /// Detail level
    pub detail: &'static str,
}

/// Anthropic-style chat message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnthropicMessage {
    /// `user` or `assistant`
    pub role: &'static str,
    /// Message content
    pub content: AnthropicContent,
}

/// Anthropic-style message content
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnthropicContent {
    /// Plain text
    Text(String),
    /// Content blocks
    Blocks(Vec<AnthropicBlock>),
}

/// Anthropic-style content block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicBlock {
    /// Text block
    Text {
        /// Text
        text: String,
    },
    /// Inline image block
    Image {
        /// Image payload
        source: AnthropicImageSource,
    },
}

/// Base64 image payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnthropicImageSource {
    /// Always `base64`
    #[serde(rename = "type")]
    pub source_type: &'static str,
    /// MIME type of `data`
    pub media_type: &'static str,
    /// Base64 image bytes
    pub data: String,
}

/// Build the instruction that asks an Anthropic-style backend for schema-conforming JSON
///
/// # Errors
/// Returns [`BackendError::Encoding`] if the schema cannot be rendered
pub fn json_schema_directive(format: &JsonSchemaFormat) -> Result<String, BackendError> {
    let pretty = serde_json::to_string_pretty(&format.schema)
        .map_err(|e| BackendError::encoding(format!("failed to render JSON schema: {e}")))?;
    Ok(format!(
        "\n\nYou must respond with valid JSON matching this schema:\n{pretty}\n\nRespond ONLY with the JSON object, no other text."
    ))
}

fn single_text(message: &Message) -> Option<&str> {
    match message.content.as_slice() {
        [ContentPart::Text(text)] => Some(text),
        _ => None,
    }
}

/// Convert a conversation to OpenAI-style messages, preserving order and roles
///
/// # Errors
/// Returns [`BackendError::Encoding`] if an image cannot be encoded
pub fn openai_messages(conversation: &Conversation) -> Result<Vec<OpenAIMessage>, BackendError> {
    conversation
        .iter()
        .map(|message| {
            let content = if let Some(text) = single_text(message) {
                OpenAIContent::Text(text.to_string())
            } else {
                let parts = message
                    .content
                    .iter()
                    .map(|part| match part {
                        ContentPart::Text(text) => Ok(OpenAIContentPart::Text { text: text.clone() }),
                        ContentPart::Image(image) => Ok(OpenAIContentPart::ImageUrl {
                            image_url: OpenAIImageUrl {
                                url: png_data_url(image)?,
                                detail: IMAGE_DETAIL,
                            },
                        }),
                    })
                    .collect::<Result<Vec<_>, BackendError>>()?;
                OpenAIContent::Parts(parts)
            };

            Ok(OpenAIMessage {
                role: message.role.as_str(),
                content,
            })
        })
        .collect()
}

/// Convert a conversation to Anthropic-style `(system, messages)`
///
/// System messages are removed from the list and joined into the system
/// text. When `schema` is given, the JSON directive is appended to it (and
/// trimmed if there was no system text).
///
/// # Errors
/// Returns [`BackendError::Encoding`] if an image or the schema cannot be encoded
pub fn anthropic_messages(
    conversation: &Conversation,
    schema: Option<&JsonSchemaFormat>,
) -> Result<(Option<String>, Vec<AnthropicMessage>), BackendError> {
    let mut system_parts = Vec::new();
    let mut messages = Vec::with_capacity(conversation.len());

    for message in conversation {
        if message.role == Role::System {
            if message.has_images() {
                warn!("Dropping images from system message; not supported by this backend");
            }
            let text = message.text();
            if !text.is_empty() {
                system_parts.push(text);
            }
            continue;
        }

        let content = if let Some(text) = single_text(message) {
            AnthropicContent::Text(text.to_string())
        } else {
            let blocks = message
                .content
                .iter()
                .map(|part| match part {
                    ContentPart::Text(text) => Ok(AnthropicBlock::Text { text: text.clone() }),
                    ContentPart::Image(image) => Ok(AnthropicBlock::Image {
                        source: AnthropicImageSource {
                            source_type: "base64",
                            media_type: PNG_MEDIA_TYPE,
                            data: png_base64(image)?,
                        },
                    }),
                })
                .collect::<Result<Vec<_>, BackendError>>()?;
            AnthropicContent::Blocks(blocks)
        };

        messages.push(AnthropicMessage {
            role: message.role.as_str(),
            content,
        });
    }

    let mut system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));

    if let Some(format) = schema {
        let directive = json_schema_directive(format)?;
        system = Some(match system {
            Some(text) => text + &directive,
            None => directive.trim().to_string(),
        });
    }

    Ok((system, messages))
}

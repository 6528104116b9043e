//! # Gateway Providers
//!
//! Backend adapters for the completion gateway.
//!
//! This crate provides implementations for the supported backend families:
//! - OpenAI-style chat completions (OpenAI, Azure OpenAI, local compatible servers)
//! - Anthropic messages
//!
//! plus the conversation normalizer and image encoder they share.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod encoding;
pub mod factory;
pub mod normalize;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "anthropic")]
pub mod anthropic;

// Re-export main types
pub use factory::create_adapter;

#[cfg(feature = "openai")]
pub use openai::{OpenAIAdapter, OpenAIAuth, OpenAIConfig};

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicAdapter, AnthropicConfig};

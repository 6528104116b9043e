//! Adapter construction from a resolved backend target.

use gateway_config::backend::LOCAL_API_KEY;
use gateway_config::{BackendTarget, GatewaySettings};
use gateway_core::{BackendAdapter, GatewayError};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::info;

#[cfg(feature = "anthropic")]
use crate::anthropic::{AnthropicAdapter, AnthropicConfig};
#[cfg(feature = "openai")]
use crate::openai::{OpenAIAdapter, OpenAIConfig};

/// Build the adapter for `model` at `target`
///
/// # Errors
/// Returns error if the target's family is not compiled in or the HTTP client cannot be built
pub fn create_adapter(
    model: &str,
    target: &BackendTarget,
    settings: &GatewaySettings,
) -> Result<Arc<dyn BackendAdapter>, GatewayError> {
    info!(
        model = %model,
        backend = target.label(),
        family = %target.family(),
        "Creating backend adapter"
    );

    match target {
        #[cfg(feature = "anthropic")]
        BackendTarget::Anthropic { base_url, api_key } => {
            let config = AnthropicConfig::new(model, base_url.clone(), api_key.clone())
                .with_timeout(settings.request_timeout)
                .with_default_max_tokens(settings.anthropic_max_tokens);
            Ok(Arc::new(AnthropicAdapter::new(config)?))
        }
        #[cfg(feature = "openai")]
        BackendTarget::OpenAI { base_url, api_key } => {
            let config = OpenAIConfig::new(model, base_url, api_key.clone())
                .with_timeout(settings.request_timeout);
            Ok(Arc::new(OpenAIAdapter::new(config)?))
        }
        #[cfg(feature = "openai")]
        BackendTarget::Local { base_url } => {
            let config =
                OpenAIConfig::new(model, base_url, SecretString::new(LOCAL_API_KEY.to_string()))
                    .with_timeout(settings.request_timeout);
            Ok(Arc::new(OpenAIAdapter::new(config)?))
        }
        #[cfg(feature = "openai")]
        BackendTarget::Azure {
            endpoint,
            api_key,
            api_version,
        } => {
            let config = OpenAIConfig::azure(model, endpoint, api_key.clone(), api_version)
                .with_timeout(settings.request_timeout);
            Ok(Arc::new(OpenAIAdapter::new(config)?))
        }
        #[allow(unreachable_patterns)]
        other => Err(GatewayError::configuration(format!(
            "backend '{}' is not enabled in this build",
            other.label()
        ))),
    }
}

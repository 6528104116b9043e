//! Backend resolution.
//!
//! Picks the backend for a model name from the environment. Resolution order:
//!
//! 1. Names starting with `claude` (any case) use the Anthropic API (`ANTHROPIC_API_KEY`).
//! 2. If `LOCAL_MODEL_API_BASE` is set and the name does not contain `gpt`,
//!    a locally hosted OpenAI-compatible server is used with a placeholder key.
//! 3. If `AZURE_OPENAI=1`, the per-model Azure deployment named by
//!    `AZURE_OPENAI_{MODEL}_ENDPOINT` / `AZURE_OPENAI_{MODEL}_API_KEY` is used,
//!    where `{MODEL}` is the model name with `-` replaced by `_`.
//! 4. Otherwise the standard OpenAI API (`OPENAI_API_KEY`).

use crate::env::GatewayEnv;
use crate::error::ConfigError;
use gateway_core::BackendFamily;
use secrecy::SecretString;
use tracing::debug;
use url::Url;

/// Anthropic API key
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
/// Anthropic base URL override
pub const ANTHROPIC_BASE_URL: &str = "ANTHROPIC_BASE_URL";
/// OpenAI API key
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// OpenAI base URL override
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
/// Base URL of a locally hosted OpenAI-compatible server
pub const LOCAL_MODEL_API_BASE: &str = "LOCAL_MODEL_API_BASE";
/// Set to `1` to route OpenAI-family models through Azure deployments
pub const AZURE_OPENAI: &str = "AZURE_OPENAI";

/// Default Anthropic API base
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
/// Default OpenAI API base
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Credential sent to local servers
pub const LOCAL_API_KEY: &str = "not-needed";

/// A resolved backend endpoint with credentials
#[derive(Debug, Clone)]
pub enum BackendTarget {
    /// Anthropic messages API
    Anthropic {
        /// API base
        base_url: Url,
        /// `x-api-key` credential
        api_key: SecretString,
    },
    /// OpenAI chat completions API
    OpenAI {
        /// API base
        base_url: Url,
        /// Bearer credential
        api_key: SecretString,
    },
    /// Locally hosted OpenAI-compatible server
    Local {
        /// API base
        base_url: Url,
    },
    /// Azure OpenAI deployment
    Azure {
        /// Deployment endpoint with the query removed
        endpoint: Url,
        /// `api-key` credential
        api_key: SecretString,
        /// `api-version` taken from the endpoint
        api_version: String,
    },
}

impl BackendTarget {
    /// Wire family spoken by this target
    #[must_use]
    pub const fn family(&self) -> BackendFamily {
        match self {
            Self::Anthropic { .. } => BackendFamily::Anthropic,
            Self::OpenAI { .. } | Self::Local { .. } | Self::Azure { .. } => BackendFamily::OpenAI,
        }
    }

    /// Short label for logs
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Anthropic { .. } => "anthropic",
            Self::OpenAI { .. } => "openai",
            Self::Local { .. } => "local",
            Self::Azure { .. } => "azure",
        }
    }
}

/// Name of the Azure variable for a model, e.g. `AZURE_OPENAI_gpt_4o_ENDPOINT`
#[must_use]
pub fn azure_var(model: &str, suffix: &str) -> String {
    format!("AZURE_OPENAI_{}_{suffix}", model.replace('-', "_"))
}

/// Resolve the backend for `model`
///
/// # Errors
/// Returns error if a required credential or endpoint is missing or malformed
pub fn resolve_backend(model: &str, env: &GatewayEnv) -> Result<BackendTarget, ConfigError> {
    let target = if model.to_ascii_lowercase().starts_with("claude") {
        let api_key = env.get(ANTHROPIC_API_KEY).ok_or_else(|| {
            ConfigError::missing(ANTHROPIC_API_KEY, "required for Claude models")
        })?;
        BackendTarget::Anthropic {
            base_url: parse_url(
                ANTHROPIC_BASE_URL,
                env.get(ANTHROPIC_BASE_URL).unwrap_or(DEFAULT_ANTHROPIC_BASE_URL),
            )?,
            api_key: SecretString::new(api_key.to_string()),
        }
    } else if let Some(base) = env.get(LOCAL_MODEL_API_BASE).filter(|_| !model.contains("gpt")) {
        BackendTarget::Local {
            base_url: parse_url(LOCAL_MODEL_API_BASE, base)?,
        }
    } else if env.flag(AZURE_OPENAI) {
        resolve_azure(model, env)?
    } else {
        let api_key = env
            .get(OPENAI_API_KEY)
            .ok_or_else(|| ConfigError::missing(OPENAI_API_KEY, "required for OpenAI models"))?;
        BackendTarget::OpenAI {
            base_url: parse_url(
                OPENAI_BASE_URL,
                env.get(OPENAI_BASE_URL).unwrap_or(DEFAULT_OPENAI_BASE_URL),
            )?,
            api_key: SecretString::new(api_key.to_string()),
        }
    };

    debug!(model = %model, backend = target.label(), "Resolved backend");
    Ok(target)
}

fn resolve_azure(model: &str, env: &GatewayEnv) -> Result<BackendTarget, ConfigError> {
    let endpoint_var = azure_var(model, "ENDPOINT");
    let key_var = azure_var(model, "API_KEY");

    let raw_endpoint = env.get(&endpoint_var).ok_or_else(|| {
        ConfigError::missing(&endpoint_var, format!("required for Azure model '{model}'"))
    })?;
    let api_key = env.get(&key_var).ok_or_else(|| {
        ConfigError::missing(&key_var, format!("required for Azure model '{model}'"))
    })?;

    let mut endpoint = parse_url(&endpoint_var, raw_endpoint)?;
    let api_version = endpoint
        .query_pairs()
        .find(|(key, _)| key == "api-version")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            ConfigError::invalid(&endpoint_var, "endpoint must carry an api-version query")
        })?;
    endpoint.set_query(None);

    Ok(BackendTarget::Azure {
        endpoint,
        api_key: SecretString::new(api_key.to_string()),
        api_version,
    })
}

fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        name: name.to_string(),
        message: e.to_string(),
    })
}

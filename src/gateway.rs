//! The gateway facade.

use gateway_config::{resolve_backend, GatewayEnv, GatewaySettings};
use gateway_core::{
    BackendAdapter, BackendArgs, BackendError, BackendFamily, CompletionRequest,
    CompletionResult, GatewayError, MetricsSink, NoopSink,
};
use gateway_providers::create_adapter;
use gateway_resilience::{ConcurrencyGate, RetryConfig, RetryPolicy};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Argument keys owned by the request shaping; callers cannot override them
pub const RESERVED_ARGS: &[&str] = &[
    "model",
    "messages",
    "response_format",
    "tools",
    "tool_choice",
    "parallel_tool_calls",
    "system",
];

/// Model name fragments that indicate image input support
const VISION_MARKERS: &[&str] = &[
    "vision",
    "gpt-4o",
    "gpt-4-turbo",
    "claude-3",
    "claude-sonnet-4",
    "gemini",
];

/// Completion gateway bound to one model
///
/// Cloning is cheap; clones share the concurrency gate and metrics sink.
#[derive(Clone)]
pub struct Gateway {
    model: String,
    family: BackendFamily,
    adapter: Arc<dyn BackendAdapter>,
    gate: ConcurrencyGate,
    retry: RetryPolicy,
    default_args: BackendArgs,
    metrics: Arc<dyn MetricsSink>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("model", &self.model)
            .field("family", &self.family)
            .field("max_concurrency", &self.gate.max_concurrent())
            .field("retry", self.retry.config())
            .field("default_args", &self.default_args)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Start building a gateway for `model`
    #[must_use]
    pub fn builder(model: impl Into<String>) -> GatewayBuilder {
        GatewayBuilder::new(model)
    }

    /// Model identifier
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Backend family resolved at build time
    #[must_use]
    pub fn family(&self) -> BackendFamily {
        self.family
    }

    /// Whether the model name indicates image input support
    #[must_use]
    pub fn supports_vision(&self) -> bool {
        let model = self.model.to_ascii_lowercase();
        VISION_MARKERS.iter().any(|marker| model.contains(marker))
    }

    /// The sink receiving usage and timing records
    #[must_use]
    pub fn metrics(&self) -> &Arc<dyn MetricsSink> {
        &self.metrics
    }

    /// Retry policy applied to each logical request
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Maximum number of logical requests in flight
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.gate.max_concurrent()
    }

    /// Logical requests currently holding a permit
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.gate.in_flight()
    }

    /// Run one logical completion
    ///
    /// The gate permit is held across every retry attempt, including the
    /// backoff sleeps. Usage is recorded for each attempt whose network call
    /// succeeded, before its reply is decoded.
    ///
    /// # Errors
    /// - [`GatewayError::InvalidRequest`] if the request is rejected before any call
    /// - [`GatewayError::RetriesExhausted`] carrying the last backend failure
    #[instrument(
        skip(self, request),
        fields(model = %self.model, family = %self.family, key = %request.metric_key)
    )]
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, GatewayError> {
        request.validate()?;
        if request.requires_tool_call() && !self.family.supports_forced_tools() {
            return Err(GatewayError::invalid_request(format!(
                "{} backends cannot enforce a mandatory tool call",
                self.family
            )));
        }

        let args = self.merge_args(&request.backend_args);
        let timing_key = format!("lm/{}", request.metric_key);
        let model_id = self.family.usage_model_id(&self.model);

        let _permit = self.gate.acquire().await?;

        self.retry
            .execute(|| self.attempt(request, &args, &timing_key, &model_id))
            .await
            .map_err(|source| GatewayError::RetriesExhausted {
                attempts: self.retry.max_attempts(),
                source,
            })
    }

    /// Run one logical completion and deserialize the result into `T`
    ///
    /// JSON results and tool call arguments are converted directly; a text
    /// result is offered to `T` as a JSON string.
    ///
    /// # Errors
    /// Same as [`Gateway::complete`], plus [`GatewayError::Deserialize`]
    /// when the result does not fit `T`
    pub async fn complete_as<T: DeserializeOwned>(
        &self,
        request: &CompletionRequest,
    ) -> Result<T, GatewayError> {
        let value = match self.complete(request).await? {
            CompletionResult::Json { value } => value,
            CompletionResult::ToolCall { arguments, .. } => arguments,
            CompletionResult::Text { text } => Value::String(text),
        };
        serde_json::from_value(value).map_err(|e| GatewayError::Deserialize {
            message: e.to_string(),
        })
    }

    async fn attempt(
        &self,
        request: &CompletionRequest,
        args: &BackendArgs,
        timing_key: &str,
        model_id: &str,
    ) -> Result<CompletionResult, BackendError> {
        let start = Instant::now();
        let reply = self.adapter.issue_call(request, args).await?;
        let end = Instant::now();

        let usage = reply.usage;
        debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            elapsed_ms = end.saturating_duration_since(start).as_millis(),
            "Backend call completed"
        );
        self.metrics.record_timing(timing_key, start, end);
        self.metrics.record_tokens(
            &request.metric_key,
            model_id,
            usage.prompt_tokens,
            usage.completion_tokens,
        );

        self.adapter.decode_result(request, reply)
    }

    fn merge_args(&self, overrides: &BackendArgs) -> BackendArgs {
        let mut args = self.default_args.merged_with(overrides);

        for key in RESERVED_ARGS {
            if args.remove(key).is_some() {
                warn!(arg = *key, "Ignoring reserved backend argument");
            }
        }

        if self.family == BackendFamily::OpenAI
            && self.model.to_ascii_lowercase().contains("gpt")
            && args.remove("max_tokens").is_some()
        {
            debug!("Dropped max_tokens for gpt model");
        }

        args
    }
}

/// Builder for [`Gateway`]
///
/// Explicit builder values win over `settings`, which default to
/// [`GatewaySettings::default`] with environment overrides applied.
#[must_use]
pub struct GatewayBuilder {
    model: String,
    settings: Option<GatewaySettings>,
    env: Option<GatewayEnv>,
    max_concurrency: Option<usize>,
    default_args: Option<BackendArgs>,
    retry_policy: Option<RetryPolicy>,
    metrics: Option<Arc<dyn MetricsSink>>,
    adapter: Option<Arc<dyn BackendAdapter>>,
}

impl GatewayBuilder {
    /// Create a builder for `model`
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            settings: None,
            env: None,
            max_concurrency: None,
            default_args: None,
            retry_policy: None,
            metrics: None,
            adapter: None,
        }
    }

    /// Maximum number of logical requests in flight
    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency);
        self
    }

    /// Arguments applied to every request, layered over the settings' defaults
    pub fn default_args(mut self, args: BackendArgs) -> Self {
        self.default_args = Some(args);
        self
    }

    /// Retry policy
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Sink for usage and timing records (default: discard)
    pub fn metrics(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// Gateway settings
    pub fn settings(mut self, settings: GatewaySettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Environment used for backend resolution (default: [`GatewayEnv::load`])
    pub fn env(mut self, env: GatewayEnv) -> Self {
        self.env = Some(env);
        self
    }

    /// Use a custom backend adapter instead of resolving one from the environment
    pub fn adapter(mut self, adapter: Arc<dyn BackendAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Resolve the backend and build the gateway
    ///
    /// # Errors
    /// Returns [`GatewayError::Configuration`] if settings are invalid or the
    /// backend's credentials are missing
    pub fn build(self) -> Result<Gateway, GatewayError> {
        if self.model.is_empty() {
            return Err(GatewayError::configuration("model cannot be empty"));
        }

        let env = self.env.unwrap_or_else(GatewayEnv::load);
        let settings = self
            .settings
            .unwrap_or_default()
            .with_env_overrides(&env)?;

        let adapter = match self.adapter {
            Some(adapter) => adapter,
            None => {
                let target = resolve_backend(&self.model, &env)?;
                create_adapter(&self.model, &target, &settings)?
            }
        };
        let family = adapter.family();

        let max_concurrency = self.max_concurrency.unwrap_or(settings.max_concurrency);
        if max_concurrency == 0 {
            return Err(GatewayError::configuration(
                "max_concurrency must be at least 1",
            ));
        }

        let retry = self.retry_policy.unwrap_or_else(|| {
            RetryPolicy::new(RetryConfig {
                max_attempts: settings.retry.max_attempts,
                initial_delay: settings.retry.initial_delay,
                max_delay: settings.retry.max_delay,
            })
        });

        let default_args = match &self.default_args {
            Some(args) => settings.default_args.merged_with(args),
            None => settings.default_args.clone(),
        };

        let metrics = self.metrics.unwrap_or_else(|| Arc::new(NoopSink));

        info!(
            model = %self.model,
            family = %family,
            max_concurrency = max_concurrency,
            max_attempts = retry.max_attempts(),
            "Gateway ready"
        );

        Ok(Gateway {
            model: self.model,
            family,
            adapter,
            gate: ConcurrencyGate::new(max_concurrency),
            retry,
            default_args,
            metrics,
        })
    }
}

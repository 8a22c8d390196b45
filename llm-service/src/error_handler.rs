//! Unified error handling for `llm-service`.
//!
//! A single top-level [`LlmError`] wraps domain-specific enums for config
//! loading and provider calls. Small env-reading helpers return the unified
//! [`Result<T>`] alias. Messages carry the `[LLM Service]` suffix to ease
//! attribution in logs.

use reqwest::StatusCode;
use thiserror::Error;

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Top-level error for the `llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LlmError {
    /// Configuration/validation errors (startup/readiness).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Provider call errors (status, decode, contract violations).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Underlying HTTP transport error.
    #[error("[LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),
}

/// Error enum for environment/config-driven setup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (ports, limits, timeouts).
    #[error("[LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_PROVIDER`.
    #[error("[LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },
}

/// Non-2xx response details.
#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub url: String,
    pub snippet: String,
}

/// Errors produced while calling a provider.
#[derive(Debug, Error)]
#[error("[LLM Service] {provider:?}: {kind}")]
pub struct ProviderError {
    pub provider: crate::config::llm_provider::LlmProvider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(
        provider: crate::config::llm_provider::LlmProvider,
        kind: ProviderErrorKind,
    ) -> Self {
        Self { provider, kind }
    }
}

#[derive(Debug, Error)]
pub enum ProviderErrorKind {
    /// The provider in the config does not match this service.
    #[error("invalid provider for this service")]
    InvalidProvider,

    /// Invalid endpoint (empty or missing http/https).
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Non-successful HTTP status from upstream.
    #[error("unexpected HTTP status {} from {}: {}", .0.status, .0.url, .0.snippet)]
    HttpStatus(HttpError),

    /// Unexpected/invalid JSON response.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The model produced no content blocks.
    #[error("empty content in model response")]
    EmptyContent,
}

/// Trims a response body down to a log-friendly snippet.
pub fn make_snippet(text: &str) -> String {
    text.chars().take(240).collect()
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty environment variable.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.parse::<u32>().map(Some).map_err(|_| {
            LlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u32",
            })
        }),
        _ => Ok(None),
    }
}

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

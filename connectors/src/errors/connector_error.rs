//! Error types for source connectors.

use thiserror::Error;

/// Connector-level failures. Per-item fetch failures inside a sync are
/// logged and skipped instead of surfacing here.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Required environment variable is missing or empty.
    #[error("[Connector] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[Connector] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    /// Transport/HTTP client error.
    #[error("[Connector] transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-successful HTTP status from the upstream API.
    #[error("[Connector] unexpected HTTP status {status} from {url}: {snippet}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
        snippet: String,
    },

    /// The upstream API reported an application-level error (e.g. Slack's
    /// `ok: false` envelope).
    #[error("[Connector] {source_name} API error: {message}")]
    Api {
        source_name: &'static str,
        message: String,
    },

    /// Unexpected/invalid JSON from the upstream API.
    #[error("[Connector] failed to decode {source_name} response: {message}")]
    Decode {
        source_name: &'static str,
        message: String,
    },
}

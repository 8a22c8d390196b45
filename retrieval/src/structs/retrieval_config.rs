//! Environment-driven configuration for the vector index.

use std::env;
use std::time::Duration;

use crate::errors::retrieval_error::RetrievalError;

/// Connection settings for the OpenSearch-compatible index.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Base endpoint, e.g. `https://search.example.com`.
    pub endpoint: String,
    /// Index name holding document chunks.
    pub index: String,
    /// Optional bearer token for authenticated clusters.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RetrievalConfig {
    /// Reads configuration from the environment.
    ///
    /// - `OPENSEARCH_ENDPOINT` (required)
    /// - `OPENSEARCH_INDEX` (default: `knowledge-base`)
    /// - `OPENSEARCH_API_KEY` (optional)
    /// - `OPENSEARCH_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, RetrievalError> {
        let endpoint = must_env("OPENSEARCH_ENDPOINT")?;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(RetrievalError::InvalidFormat {
                var: "OPENSEARCH_ENDPOINT",
                reason: "must start with http:// or https://",
            });
        }

        let index = env::var("OPENSEARCH_INDEX")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "knowledge-base".to_string());

        let api_key = env::var("OPENSEARCH_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let timeout_secs = match env::var("OPENSEARCH_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| RetrievalError::InvalidFormat {
                var: "OPENSEARCH_TIMEOUT_SECS",
                reason: "must be a positive integer",
            })?,
            Err(_) => 30,
        };

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            index,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn must_env(name: &'static str) -> Result<String, RetrievalError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(RetrievalError::MissingVar(name))
}

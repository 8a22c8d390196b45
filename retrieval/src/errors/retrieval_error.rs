//! Error types for the retrieval crate.

use thiserror::Error;

/// Errors surfaced by indexing and search operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Required environment variable is missing or empty.
    #[error("[Retrieval] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[Retrieval] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    /// Transport/HTTP client error.
    #[error("[Retrieval] transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-successful HTTP status from the index.
    #[error("[Retrieval] unexpected HTTP status {status} from {url}: {snippet}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
        snippet: String,
    },

    /// Unexpected/invalid JSON response from the index.
    #[error("[Retrieval] failed to decode index response: {0}")]
    Decode(String),

    /// Embedding the query or a chunk failed.
    #[error("[Retrieval] embedding failed: {0}")]
    Embedding(#[from] llm_service::LlmError),
}

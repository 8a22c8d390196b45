//! Unified error handling for `query-client`.
//!
//! All reconciliation failures are caught at the reconciliation boundary and
//! recorded into [`crate::QueryResult::error`]; nothing propagates to the
//! caller as a panic or a bubbled `Err` past [`crate::QuerySession::ask`].

use thiserror::Error;

/// Result alias for query-client operations.
pub type Result<T> = std::result::Result<T, QueryClientError>;

/// Failure modes of one query reconciliation.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum QueryClientError {
    /// The client configuration cannot produce a usable endpoint.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Upstream reported a non-2xx status; message carries the status text.
    #[error("request failed: {status_text}")]
    RequestFailed {
        status: reqwest::StatusCode,
        status_text: String,
    },

    /// A 2xx status arrived with no body at all.
    #[error("empty response body")]
    EmptyResponse,

    /// Connection-level failure while sending or reading the stream.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    /// A buffered `application/json` body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,
}

impl QueryClientError {
    /// Builds the non-2xx variant with the canonical status reason.
    pub fn request_failed(status: reqwest::StatusCode) -> Self {
        QueryClientError::RequestFailed {
            status,
            status_text: status
                .canonical_reason()
                .unwrap_or("Unknown Status")
                .to_string(),
        }
    }
}

impl From<reqwest::Error> for QueryClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            QueryClientError::Timeout
        } else {
            QueryClientError::Transport(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failed_carries_canonical_status_text() {
        let err = QueryClientError::request_failed(reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("Internal Server Error"));
    }
}

//! Wire DTOs shared between the query API and its clients.
//!
//! The shapes here are the HTTP contract of `POST /api/query`: the request
//! body, the buffered response document, the per-event streaming frames, and
//! the caller-visible result slot a reconciliation mutates.

use serde::{Deserialize, Serialize};

/// Knowledge source a document or citation originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Confluence,
    Slack,
    Jira,
    GitHub,
}

impl SourceType {
    /// Lowercase tag used in index payloads and wire bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Confluence => "confluence",
            SourceType::Slack => "slack",
            SourceType::Jira => "jira",
            SourceType::GitHub => "github",
        }
    }
}

/// Request body for `POST /api/query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_filter: Option<Vec<SourceType>>,
}

impl QueryRequest {
    /// Request with defaults for `top_k` and `source_filter`.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: None,
            source_filter: None,
        }
    }
}

/// One retrieved document fragment with provenance metadata.
///
/// Immutable once received; `relevance_score` is expected in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub title: String,
    pub url: String,
    pub source_type: SourceType,
    pub relevance_score: f32,
    pub snippet: String,
}

/// Buffered response document for `POST /api/query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceCitation>,
    pub query: String,
    /// ISO-8601 timestamp of answer generation.
    pub timestamp: String,
}

/// One newline-delimited frame of the negotiated streaming protocol
/// (`Content-Type: application/x-ndjson`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamChunk {
    /// Incremental answer text; appended in arrival order.
    Token { content: String },
    /// Citation list, delivered at most once per query.
    Sources { sources: Vec<SourceCitation> },
    /// Final document; supersedes accumulated tokens.
    Complete { data: QueryResponse },
    /// Server-side failure mid-stream.
    Error { message: String },
}

/// Caller-visible result slot for one query lifecycle.
///
/// A fresh value is installed at the start of each query; reconciliation
/// mutates it in place as response data arrives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Accumulated or final answer text.
    pub answer: String,
    /// Populated at most once per query; never merged incrementally.
    pub sources: Vec<SourceCitation>,
    /// Failure message, if the reconciliation failed.
    pub error: Option<String>,
    /// True from query start until the reconciliation settles.
    pub is_loading: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_type_serializes_lowercase() {
        let json = serde_json::to_string(&SourceType::GitHub).unwrap();
        assert_eq!(json, "\"github\"");
        let back: SourceType = serde_json::from_str("\"confluence\"").unwrap();
        assert_eq!(back, SourceType::Confluence);
    }

    #[test]
    fn query_request_omits_absent_options() {
        let body = serde_json::to_value(QueryRequest::new("where is the runbook?")).unwrap();
        assert_eq!(body["query"], "where is the runbook?");
        assert!(body.get("top_k").is_none());
        assert!(body.get("source_filter").is_none());
    }

    #[test]
    fn stream_chunk_round_trips_tagged_frames() {
        let frame: StreamChunk =
            serde_json::from_str(r#"{"type":"token","content":"Hel"}"#).unwrap();
        assert_eq!(
            frame,
            StreamChunk::Token {
                content: "Hel".into()
            }
        );
    }
}

//! The normalized document every connector produces.

use query_client::SourceType;
use serde::Serialize;

/// One logical document fetched from a source system, rendered to plain
/// text and ready for chunking.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Stable identifier within the source system (page id, channel id,
    /// issue key, repository full name).
    pub origin_id: String,
    pub source: SourceType,
    pub title: String,
    pub url: String,
    pub text: String,
    pub metadata: serde_json::Value,
}

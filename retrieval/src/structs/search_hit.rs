//! Data carried between the index and callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single document chunk stored in the vector index.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkRecord {
    pub embedding: Vec<f32>,
    pub text: String,
    pub document_id: String,
    pub chunk_id: String,
    pub chunk_index: usize,
    pub source: String,
    pub source_url: String,
    pub title: String,
    pub metadata: serde_json::Value,
    pub timestamp: String,
}

/// One search hit returned from a knn query, with index fields flattened out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub text: String,
    pub title: String,
    pub source: String,
    pub source_url: String,
    pub document_id: String,
    pub score: f32,
}

/// Document counts per source, from a terms aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceStats {
    pub sources: BTreeMap<String, u64>,
    pub total_documents: u64,
}

/// Input to [`crate::ingest_document`]: one logical document from a connector.
#[derive(Debug, Clone)]
pub struct IngestDocument {
    /// Stable identifier within the source system (page id, channel id, issue key).
    pub origin_id: String,
    pub source: String,
    pub title: String,
    pub url: String,
    pub text: String,
    pub metadata: serde_json::Value,
}

/// Outcome of ingesting one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestStats {
    pub chunks_indexed: usize,
    pub skipped: bool,
    pub duration_ms: u64,
}

//! Retrieval layer: chunking, embedding, and vector search over an
//! OpenSearch-compatible index.
//!
//! The ingest path takes one logical document from a connector, splits it
//! into overlapping chunks, embeds each chunk, and upserts the chunks under
//! deterministic ids so re-running a sync overwrites instead of duplicating.

pub mod errors;
pub mod splitter;
pub mod structs;
pub mod vector_index;

use chrono::Utc;
use llm_service::LlmProfiles;
use tracing::{info, warn};
use uuid::Uuid;

pub use errors::retrieval_error::RetrievalError;
pub use splitter::TextSplitter;
pub use structs::retrieval_config::RetrievalConfig;
pub use structs::search_hit::{ChunkRecord, IngestDocument, IngestStats, SearchHit, SourceStats};
pub use vector_index::VectorIndex;

/// Documents shorter than this (after trimming) are not worth embedding.
const MIN_DOCUMENT_CHARS: usize = 10;

/// Namespace for deterministic document/chunk ids.
const ID_NAMESPACE: Uuid = Uuid::NAMESPACE_URL;

/// Deterministic id for a document, stable across repeated syncs.
pub fn document_id(source: &str, origin_id: &str) -> String {
    Uuid::new_v5(&ID_NAMESPACE, format!("{source}/{origin_id}").as_bytes()).to_string()
}

/// Splits, embeds, and indexes one document.
pub async fn ingest_document(
    llm: &LlmProfiles,
    index: &VectorIndex,
    doc: &IngestDocument,
) -> Result<IngestStats, RetrievalError> {
    let started = std::time::Instant::now();
    let trimmed = doc.text.trim();
    if trimmed.chars().count() < MIN_DOCUMENT_CHARS {
        warn!(
            target: "retrieval",
            source = %doc.source,
            origin = %doc.origin_id,
            "skipping near-empty document"
        );
        return Ok(IngestStats {
            chunks_indexed: 0,
            skipped: true,
            duration_ms: started.elapsed().as_millis() as u64,
        });
    }

    let doc_id = document_id(&doc.source, &doc.origin_id);
    let chunks = TextSplitter::default().split(trimmed);
    let timestamp = Utc::now().to_rfc3339();

    for (chunk_index, text) in chunks.iter().enumerate() {
        let embedding = llm.embed(text).await?;
        let record = ChunkRecord {
            embedding,
            text: text.clone(),
            document_id: doc_id.clone(),
            chunk_id: format!("{doc_id}-{chunk_index}"),
            chunk_index,
            source: doc.source.clone(),
            source_url: doc.url.clone(),
            title: doc.title.clone(),
            metadata: doc.metadata.clone(),
            timestamp: timestamp.clone(),
        };
        index.index_chunk(&record).await?;
    }

    info!(
        target: "retrieval",
        source = %doc.source,
        document_id = %doc_id,
        chunks = chunks.len(),
        "document ingested"
    );
    Ok(IngestStats {
        chunks_indexed: chunks.len(),
        skipped: false,
        duration_ms: started.elapsed().as_millis() as u64,
    })
}

/// Embeds the query and runs a knn search, optionally filtered by source.
pub async fn search_similar(
    llm: &LlmProfiles,
    index: &VectorIndex,
    query: &str,
    top_k: usize,
    source_filter: Option<&[String]>,
) -> Result<Vec<SearchHit>, RetrievalError> {
    let embedding = llm.embed(query).await?;
    index.knn_search(&embedding, top_k, source_filter).await
}

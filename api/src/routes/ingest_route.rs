//! POST /api/ingest — run one connector sync through the ingest pipeline.

use axum::{Json, extract::State};
use chrono::Utc;
use query_client::SourceType;
use retrieval::IngestDocument;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{core::app_state::AppState, error_handler::AppResult};

#[derive(Deserialize)]
pub struct IngestRequest {
    pub source: SourceType,
    /// Per-source item cap; connector default when omitted.
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct IngestedDocument {
    pub origin_id: String,
    pub title: String,
    pub chunks_indexed: usize,
    pub skipped: bool,
    pub duration_ms: u64,
}

#[derive(Serialize)]
pub struct IngestResponse {
    pub source: SourceType,
    pub documents_fetched: usize,
    pub documents_indexed: usize,
    pub documents_failed: usize,
    pub chunks_indexed: usize,
    pub documents: Vec<IngestedDocument>,
    pub timestamp: String,
}

pub async fn ingest_route(
    State(state): State<AppState>,
    Json(body): Json<IngestRequest>,
) -> AppResult<Json<IngestResponse>> {
    let fetched = connectors::fetch_documents(body.source, body.limit).await?;
    state.index.ensure_index().await?;

    let mut documents = Vec::with_capacity(fetched.len());
    let mut documents_failed = 0usize;
    let mut chunks_indexed = 0usize;

    for doc in &fetched {
        let ingest_doc = IngestDocument {
            origin_id: doc.origin_id.clone(),
            source: doc.source.as_str().to_string(),
            title: doc.title.clone(),
            url: doc.url.clone(),
            text: doc.text.clone(),
            metadata: doc.metadata.clone(),
        };
        match retrieval::ingest_document(&state.llm, &state.index, &ingest_doc).await {
            Ok(stats) => {
                chunks_indexed += stats.chunks_indexed;
                documents.push(IngestedDocument {
                    origin_id: doc.origin_id.clone(),
                    title: doc.title.clone(),
                    chunks_indexed: stats.chunks_indexed,
                    skipped: stats.skipped,
                    duration_ms: stats.duration_ms,
                });
            }
            Err(e) => {
                warn!(
                    target: "api",
                    origin = %doc.origin_id,
                    error = %e,
                    "ingest: document failed"
                );
                documents_failed += 1;
            }
        }
    }

    let documents_indexed = documents.iter().filter(|d| !d.skipped).count();
    info!(
        target: "api",
        source = body.source.as_str(),
        fetched = fetched.len(),
        indexed = documents_indexed,
        failed = documents_failed,
        chunks = chunks_indexed,
        "ingest: sync finished"
    );

    Ok(Json(IngestResponse {
        source: body.source,
        documents_fetched: fetched.len(),
        documents_indexed,
        documents_failed,
        chunks_indexed,
        documents,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

//! GET /api/sources — per-source document counts.

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::{core::app_state::AppState, error_handler::AppResult};

#[derive(Serialize)]
pub struct SourcesResponse {
    pub sources: BTreeMap<String, u64>,
    pub total_documents: u64,
    pub timestamp: String,
}

pub async fn sources_route(State(state): State<AppState>) -> AppResult<Json<SourcesResponse>> {
    let stats = state.index.source_stats().await?;
    debug!(
        target: "api",
        total = stats.total_documents,
        sources = stats.sources.len(),
        "sources: aggregated"
    );
    Ok(Json(SourcesResponse {
        sources: stats.sources,
        total_documents: stats.total_documents,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

//! POST /api/query — the RAG pipeline: embed, search, generate, cite.

use axum::{Json, extract::State};
use chrono::Utc;
use query_client::{QueryRequest, QueryResponse};
use tracing::{debug, info};

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::query::prompt::{NO_RESULTS_ANSWER, SYSTEM_PROMPT, build_prompt, map_citations},
};

const DEFAULT_TOP_K: usize = 5;

/// Handler: POST /api/query
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/api/query \
///   -H 'content-type: application/json' \
///   -d '{"query":"where is the deploy runbook?","top_k":5}'
/// ```
pub async fn query_route(
    State(state): State<AppState>,
    Json(body): Json<QueryRequest>,
) -> AppResult<Json<QueryResponse>> {
    let query = body.query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("query must not be empty".to_string()));
    }

    debug!(target: "api", query = %query, "query: start");

    let top_k = body.top_k.map(|k| k as usize).unwrap_or(DEFAULT_TOP_K);
    let source_filter: Option<Vec<String>> = body.source_filter.as_ref().map(|sources| {
        sources
            .iter()
            .map(|s| s.as_str().to_string())
            .collect()
    });

    let hits = retrieval::search_similar(
        &state.llm,
        &state.index,
        query,
        top_k,
        source_filter.as_deref(),
    )
    .await?;

    if hits.is_empty() {
        info!(target: "api", query = %query, "query: no relevant documents");
        return Ok(Json(QueryResponse {
            answer: NO_RESULTS_ANSWER.to_string(),
            sources: Vec::new(),
            query: query.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }));
    }

    let prompt = build_prompt(query, &hits);
    let answer = state.llm.generate(&prompt, Some(SYSTEM_PROMPT)).await?;
    let sources = map_citations(&hits);

    info!(target: "api", query = %query, hits = hits.len(), "query: answered");
    Ok(Json(QueryResponse {
        answer,
        sources,
        query: query.to_string(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}

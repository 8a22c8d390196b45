//! GET /health — liveness plus provider probe snapshots.

use axum::{Json, extract::State};
use chrono::Utc;
use llm_service::HealthStatus;
use serde::Serialize;

use crate::core::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    /// Best-effort reachability of the answer/embedding backends; a failed
    /// probe does not change `status`.
    pub providers: Vec<HealthStatus>,
}

pub async fn health_route(State(state): State<AppState>) -> Json<HealthResponse> {
    let providers = state.llm.health_all().await;
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
        providers,
    })
}

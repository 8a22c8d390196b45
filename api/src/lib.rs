//! HTTP surface of the knowledge hub: query, sources, ingest, health.

use std::env;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing::info;

pub mod core;
pub mod error_handler;
mod routes;

use crate::core::app_state::AppState;
use crate::error_handler::AppError;
use crate::routes::{
    health_route::health_route, ingest_route::ingest_route, query::query_route::query_route,
    root_route::root_route, sources_route::sources_route,
};

const DEFAULT_ADDRESS: &str = "0.0.0.0:8080";

/// Builds the application router over shared state. Public so integration
/// tests can drive it without a listener.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_route))
        .route("/health", get(health_route))
        .route("/api/query", post(query_route))
        .route("/api/sources", get(sources_route))
        .route("/api/ingest", post(ingest_route))
        .with_state(state)
}

pub async fn start() -> Result<(), AppError> {
    let host_url = env::var("API_ADDRESS").unwrap_or_else(|_| DEFAULT_ADDRESS.to_string());

    let state = AppState::from_env()?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(target: "api", address = %host_url, "listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(target: "api", error = %e, "failed to listen for shutdown signal");
    }
}

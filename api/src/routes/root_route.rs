//! GET / — service identity document.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

pub async fn root_route() -> Json<RootResponse> {
    Json(RootResponse {
        message: "VaultIQ API",
        version: env!("CARGO_PKG_VERSION"),
        status: "active",
    })
}

//! Health check endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub directory: String,
}

/// Health check endpoint. Reports whether a directory snapshot has been
/// captured; an empty cache is not unhealthy (the gate degrades per its
/// fail policy), so this always returns 200 once the server is up.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let directory = if state.gate.cache().has_snapshot() {
        "cached".to_string()
    } else {
        "empty".to_string()
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            directory,
        }),
    )
}

/// Liveness probe (just returns 200 if the server is running)
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

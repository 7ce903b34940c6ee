//! Router wiring

pub mod health;

use axum::{middleware, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::state::AppState;

/// Placeholder for the application mounted behind the gate. Real
/// deployments replace this with their own routes or an upstream proxy.
async fn index() -> Json<Value> {
    Json(json!({ "status": "authorized" }))
}

/// Create the router with the authorization gate applied to every route.
/// Exempt paths (health probes, static assets, the login surfaces) are
/// let through by the gate's route classifier, not by router layout.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

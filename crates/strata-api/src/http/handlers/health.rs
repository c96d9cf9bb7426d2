//! Liveness endpoint.

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /health - Simple health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.query_service.model(),
        "dimensions": state.config.embedding.dimensions,
    }))
}

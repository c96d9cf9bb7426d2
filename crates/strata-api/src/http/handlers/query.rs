//! Retrieval-augmented query endpoint.
//!
//! POST /api/v1/query - Embed the question, search the dimension indexes,
//! and answer from the retrieved evidence.

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::Instrument;

use strata_types::query::{QueryRequest, QueryResponse};

use crate::http::error::AppError;
use crate::state::AppState;

/// POST /api/v1/query - Answer a question from the knowledge base.
///
/// A malformed body or a missing or blank `query` is a 400. Failures while
/// embedding, searching or generating are a 500 carrying the failure message.
pub async fn query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, AppError> {
    let Json(body) = payload?;
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7();
    let span = tracing::info_span!("http.query", %request_id);

    let response = state.query_service.answer(&body).instrument(span).await?;
    tracing::info!(
        %request_id,
        dimension = response.dimension,
        results = response.results_found,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "query answered"
    );
    Ok(Json(response))
}

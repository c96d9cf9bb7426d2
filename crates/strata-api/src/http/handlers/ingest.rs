//! Upload trigger endpoint.
//!
//! POST /api/v1/ingest - Accept an upload event and run the ingestion in the
//! background. The key arrives form-encoded, as storage notifications send it.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::Instrument;

use strata_core::ingest::driver::drive;
use strata_core::ingest::trigger::{decode_trigger, TriggerDecision};

use crate::http::error::AppError;
use crate::state::AppState;

/// Request body for the ingest trigger.
#[derive(Debug, Deserialize)]
pub struct IngestTrigger {
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub key: String,
}

/// POST /api/v1/ingest - Queue an uploaded object for ingestion.
///
/// Returns 202 once the run is spawned. Keys under derived-artifact prefixes
/// are acknowledged with `accepted: false` and never ingested.
pub async fn trigger_ingest(
    State(state): State<AppState>,
    payload: Result<Json<IngestTrigger>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let Json(body) = payload?;
    if body.bucket.trim().is_empty() {
        return Err(AppError::Validation("bucket is required".to_string()));
    }

    let location = match decode_trigger(&body.bucket, &body.key) {
        TriggerDecision::Ingest(location) => location,
        TriggerDecision::Skip { key, reason } => {
            tracing::info!(bucket = %body.bucket, %key, %reason, "upload ignored");
            return Ok((
                StatusCode::OK,
                Json(serde_json::json!({
                    "accepted": false,
                    "bucket": body.bucket,
                    "key": key,
                    "reason": reason,
                })),
            ));
        }
    };

    let request_id = uuid::Uuid::now_v7();
    let response = serde_json::json!({
        "accepted": true,
        "bucket": location.bucket,
        "key": location.key,
    });

    let orchestrator = state.orchestrator.clone();
    let span = tracing::info_span!("http.ingest", %request_id);
    tokio::spawn(
        async move {
            let report = drive(&orchestrator, location).await;
            if report.is_success() {
                tracing::info!(
                    status = %report.status,
                    vectors = report.vectors_stored,
                    "background ingestion finished"
                );
            } else {
                tracing::error!(
                    error = report.error.as_deref().unwrap_or("unknown"),
                    "background ingestion failed"
                );
            }
        }
        .instrument(span),
    );

    Ok((StatusCode::ACCEPTED, Json(response)))
}

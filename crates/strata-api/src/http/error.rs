//! Application error type mapping to HTTP status codes.
//!
//! Error bodies are `{"error": ..., "message": ...}`. Server-side failures
//! carry the failure message but never a backtrace.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use strata_types::error::RetrievalError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Query pipeline errors.
    Retrieval(RetrievalError),
    /// Validation error, including unreadable request bodies.
    Validation(String),
}

impl From<RetrievalError> for AppError {
    fn from(e: RetrievalError) -> Self {
        AppError::Retrieval(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    fn status_and_body(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Retrieval(e) if e.is_client_error() => {
                (StatusCode::BAD_REQUEST, "Invalid request", e.to_string())
            }
            AppError::Retrieval(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", e.to_string())
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "Invalid request", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = self.status_and_body();
        if status.is_server_error() {
            tracing::error!(%message, "request failed");
        }

        let body = json!({
            "error": error,
            "message": message,
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

//! HTTP/REST API layer for Strata.
//!
//! Axum-based REST API at `/api/v1/` for queries and upload triggers, with
//! CORS and request tracing.

pub mod error;
pub mod handlers;
pub mod router;

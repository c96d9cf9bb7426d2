//! Business logic and port trait definitions for Strata.
//!
//! This crate defines the "ports" (embedding service, vector index, blob
//! store, document extractor, generation provider) that the infrastructure
//! layer implements, and the ingestion and retrieval pipelines built on
//! them. It depends only on `strata-types` -- never on `strata-infra` or any
//! network or database crate.

pub mod embedding;
pub mod ingest;
pub mod llm;
pub mod retrieval;
pub mod storage;
pub mod transform;
pub mod vector;

#[cfg(test)]
pub(crate) mod test_support;

//! Storage abstractions for Strata.
//!
//! Defines traits for blob storage and derived document artifacts.
//! Implementations live in strata-infra.

pub mod blob_store;
pub mod box_blob_store;
pub mod extractor;

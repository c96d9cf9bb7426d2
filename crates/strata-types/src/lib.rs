//! Shared domain types for Strata.
//!
//! This crate contains the types used across the Strata pipeline: source
//! objects, embedding jobs, segments, stored vectors, queries, generation
//! content blocks, configuration and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod job;
pub mod llm;
pub mod media;
pub mod query;
pub mod segment;
pub mod vector;

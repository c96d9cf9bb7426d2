//! Vector index trait.
//!
//! One nearest-neighbour index per embedding dimension, addressed by
//! dimension and named with [`strata_types::vector::index_name`].
//! Implementations (e.g., LanceDB, in-memory) live in strata-infra.

use std::collections::HashMap;

use strata_types::error::ServiceError;
use strata_types::vector::{DistanceMetric, IndexMatch, StoredVector};

/// Trait for dimension-partitioned vector storage with nearest-neighbour search.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait VectorIndex: Send + Sync {
    /// Distance normalization of the returned `distance` values.
    fn metric(&self) -> DistanceMetric;

    /// Whether stored vectors can be read back with [`VectorIndex::vectors`].
    fn returns_vectors(&self) -> bool;

    /// Write vectors to the index matching each vector's dimension.
    ///
    /// Writes overwrite any existing entry with the same key.
    fn put(
        &self,
        vectors: &[StoredVector],
    ) -> impl std::future::Future<Output = Result<(), ServiceError>> + Send;

    /// Return up to `top_k` nearest entries in the `dimension` index.
    fn query(
        &self,
        dimension: usize,
        vector: &[f32],
        top_k: usize,
    ) -> impl std::future::Future<Output = Result<Vec<IndexMatch>, ServiceError>> + Send;

    /// Stored vectors for `keys` in the `dimension` index, by key.
    ///
    /// Keys with no entry are absent from the map.
    fn vectors(
        &self,
        dimension: usize,
        keys: &[String],
    ) -> impl std::future::Future<Output = Result<HashMap<String, Vec<f32>>, ServiceError>> + Send;

    /// Number of entries in the `dimension` index (0 if it does not exist).
    fn count(
        &self,
        dimension: usize,
    ) -> impl std::future::Future<Output = Result<usize, ServiceError>> + Send;
}

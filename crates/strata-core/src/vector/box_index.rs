//! BoxVectorIndex -- object-safe dynamic dispatch wrapper for VectorIndex.
//!
//! Lets the index backend (LanceDB or in-memory) be chosen from config at
//! runtime.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use strata_types::error::ServiceError;
use strata_types::vector::{DistanceMetric, IndexMatch, StoredVector};

use super::index::VectorIndex;

/// Object-safe version of [`VectorIndex`] with boxed futures.
pub trait VectorIndexDyn: Send + Sync {
    fn metric_dyn(&self) -> DistanceMetric;

    fn returns_vectors_dyn(&self) -> bool;

    fn put_boxed<'a>(
        &'a self,
        vectors: &'a [StoredVector],
    ) -> Pin<Box<dyn Future<Output = Result<(), ServiceError>> + Send + 'a>>;

    fn query_boxed<'a>(
        &'a self,
        dimension: usize,
        vector: &'a [f32],
        top_k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<IndexMatch>, ServiceError>> + Send + 'a>>;

    fn vectors_boxed<'a>(
        &'a self,
        dimension: usize,
        keys: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<HashMap<String, Vec<f32>>, ServiceError>> + Send + 'a>>;

    fn count_boxed<'a>(
        &'a self,
        dimension: usize,
    ) -> Pin<Box<dyn Future<Output = Result<usize, ServiceError>> + Send + 'a>>;
}

impl<T: VectorIndex> VectorIndexDyn for T {
    fn metric_dyn(&self) -> DistanceMetric {
        self.metric()
    }

    fn returns_vectors_dyn(&self) -> bool {
        self.returns_vectors()
    }

    fn put_boxed<'a>(
        &'a self,
        vectors: &'a [StoredVector],
    ) -> Pin<Box<dyn Future<Output = Result<(), ServiceError>> + Send + 'a>> {
        Box::pin(self.put(vectors))
    }

    fn query_boxed<'a>(
        &'a self,
        dimension: usize,
        vector: &'a [f32],
        top_k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<IndexMatch>, ServiceError>> + Send + 'a>> {
        Box::pin(self.query(dimension, vector, top_k))
    }

    fn vectors_boxed<'a>(
        &'a self,
        dimension: usize,
        keys: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<HashMap<String, Vec<f32>>, ServiceError>> + Send + 'a>> {
        Box::pin(self.vectors(dimension, keys))
    }

    fn count_boxed<'a>(
        &'a self,
        dimension: usize,
    ) -> Pin<Box<dyn Future<Output = Result<usize, ServiceError>> + Send + 'a>> {
        Box::pin(self.count(dimension))
    }
}

/// Type-erased vector index.
pub struct BoxVectorIndex {
    inner: Box<dyn VectorIndexDyn + Send + Sync>,
}

impl BoxVectorIndex {
    pub fn new<T: VectorIndex + 'static>(index: T) -> Self {
        Self {
            inner: Box::new(index),
        }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.inner.metric_dyn()
    }

    pub fn returns_vectors(&self) -> bool {
        self.inner.returns_vectors_dyn()
    }

    pub async fn put(&self, vectors: &[StoredVector]) -> Result<(), ServiceError> {
        self.inner.put_boxed(vectors).await
    }

    pub async fn query(
        &self,
        dimension: usize,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, ServiceError> {
        self.inner.query_boxed(dimension, vector, top_k).await
    }

    pub async fn vectors(&self, dimension: usize, keys: &[String]) -> Result<HashMap<String, Vec<f32>>, ServiceError> {
        self.inner.vectors_boxed(dimension, keys).await
    }

    pub async fn count(&self, dimension: usize) -> Result<usize, ServiceError> {
        self.inner.count_boxed(dimension).await
    }
}

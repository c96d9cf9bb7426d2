//! In-memory dimension indexes.
//!
//! Brute-force cosine search over a [`DashMap`] per dimension. Stored vectors
//! can be read back, so hierarchical re-ranking can run locally. Used for
//! ephemeral runs and as the `memory` index backend.

use std::collections::{BTreeMap, HashMap};

use dashmap::DashMap;

use strata_core::transform::cosine_similarity;
use strata_core::vector::index::VectorIndex;
use strata_types::error::ServiceError;
use strata_types::vector::{DistanceMetric, IndexMatch, StoredVector, VectorMetadata};

#[derive(Debug, Clone)]
struct Entry {
    vector: Vec<f32>,
    metadata: VectorMetadata,
}

#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    indexes: DashMap<usize, BTreeMap<String, Entry>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorIndex for InMemoryVectorIndex {
    fn metric(&self) -> DistanceMetric {
        DistanceMetric::Cosine
    }

    fn returns_vectors(&self) -> bool {
        true
    }

    async fn put(&self, vectors: &[StoredVector]) -> Result<(), ServiceError> {
        if let Some(bad) = vectors.iter().find(|v| v.vector.len() != v.dimension) {
            return Err(ServiceError::Index(format!(
                "vector {} has {} values but targets the {}d index",
                bad.key,
                bad.vector.len(),
                bad.dimension
            )));
        }
        for v in vectors {
            self.indexes.entry(v.dimension).or_default().insert(
                v.key.clone(),
                Entry {
                    vector: v.vector.clone(),
                    metadata: v.metadata.clone(),
                },
            );
        }
        Ok(())
    }

    async fn query(&self, dimension: usize, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>, ServiceError> {
        if vector.len() != dimension {
            return Err(ServiceError::Index(format!(
                "a {}-dimensional query cannot search the {dimension}d index",
                vector.len()
            )));
        }
        let Some(index) = self.indexes.get(&dimension) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<IndexMatch> = index
            .iter()
            .map(|(key, entry)| IndexMatch {
                key: key.clone(),
                distance: 1.0 - cosine_similarity(vector, &entry.vector),
                metadata: entry.metadata.clone(),
            })
            .collect();
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn vectors(&self, dimension: usize, keys: &[String]) -> Result<HashMap<String, Vec<f32>>, ServiceError> {
        let Some(index) = self.indexes.get(&dimension) else {
            return Ok(HashMap::new());
        };
        Ok(keys
            .iter()
            .filter_map(|key| index.get(key).map(|entry| (key.clone(), entry.vector.clone())))
            .collect())
    }

    async fn count(&self, dimension: usize) -> Result<usize, ServiceError> {
        Ok(self.indexes.get(&dimension).map_or(0, |index| index.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(key: &str, vector: Vec<f32>) -> StoredVector {
        let mut metadata = VectorMetadata::new();
        metadata.insert("fileName", key);
        StoredVector {
            key: key.to_string(),
            dimension: vector.len(),
            vector,
            metadata,
        }
    }

    #[tokio::test]
    async fn test_nearest_first() {
        let index = InMemoryVectorIndex::new();
        index
            .put(&[
                stored("far", vec![-1.0, 0.0]),
                stored("near", vec![1.0, 0.1]),
                stored("mid", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let matches = index.query(2, &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].key, "near");
        assert_eq!(matches[1].key, "mid");
        assert!((matches[1].distance - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_vectors_by_key_and_dimension() {
        let index = InMemoryVectorIndex::new();
        index
            .put(&[
                stored("a", vec![1.0, 0.0]),
                stored("a", vec![0.0, 0.0, 1.0]),
                stored("b", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();
        assert!(index.returns_vectors());

        let found = index
            .vectors(3, &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found["a"], vec![0.0, 0.0, 1.0]);
        assert!(index.vectors(8, &["a".to_string()]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_overwrites_and_counts_per_dimension() {
        let index = InMemoryVectorIndex::new();
        index.put(&[stored("k", vec![1.0, 0.0])]).await.unwrap();
        index.put(&[stored("k", vec![0.0, 1.0])]).await.unwrap();
        index.put(&[stored("k", vec![0.0, 1.0, 0.0])]).await.unwrap();

        assert_eq!(index.count(2).await.unwrap(), 1);
        assert_eq!(index.count(3).await.unwrap(), 1);
        assert_eq!(index.count(256).await.unwrap(), 0);
        let matches = index.query(2, &[0.0, 1.0], 1).await.unwrap();
        assert!(matches[0].distance.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_rejects_wrong_lengths() {
        let index = InMemoryVectorIndex::new();
        let mut bad = stored("x", vec![1.0]);
        bad.dimension = 2;
        assert!(index.put(&[bad]).await.is_err());
        assert!(index.query(2, &[1.0], 1).await.is_err());
        assert!(index.query(4, &[1.0; 4], 1).await.unwrap().is_empty());
    }
}

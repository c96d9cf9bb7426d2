//! LanceDB-backed dimension indexes.
//!
//! Implements [`VectorIndex`] with one table per embedding dimension
//! (`embeddings-{dim}d`). Search uses cosine distance. Matches carry no
//! vectors; stored vectors are read back by key with a filtered scan.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use arrow_array::{Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures_util::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};

use strata_core::vector::index::VectorIndex;
use strata_types::error::ServiceError;
use strata_types::vector::{DistanceMetric, IndexMatch, StoredVector, VectorMetadata, index_name};

use super::lance::{LanceVectorStore, dimension_width};
use super::schema::{
    DISTANCE_COLUMN, KEY_COLUMN, METADATA_COLUMN, VECTOR_COLUMN, embedding_schema, item_field,
};

pub struct LanceVectorIndex {
    store: LanceVectorStore,
    // Lance commits conflict under concurrent delete+append on one table.
    write_lock: tokio::sync::Mutex<()>,
}

impl LanceVectorIndex {
    pub fn new(store: LanceVectorStore) -> Self {
        Self {
            store,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Build an Arrow RecordBatch for vectors that all share `dimension`.
    fn build_record_batch(dimension: usize, vectors: &[&StoredVector]) -> Result<RecordBatch, ServiceError> {
        let width = dimension_width(dimension)?;
        let schema = Arc::new(embedding_schema(width));

        let keys = StringArray::from(vectors.iter().map(|v| v.key.as_str()).collect::<Vec<_>>());
        let modalities = StringArray::from(
            vectors
                .iter()
                .map(|v| v.metadata.get_str("modalityType"))
                .collect::<Vec<_>>(),
        );
        let metadata = vectors
            .iter()
            .map(|v| serde_json::to_string(&v.metadata))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ServiceError::Index(format!("Failed to encode metadata: {e}")))?;
        let metadata = StringArray::from(metadata);

        let values: Vec<f32> = vectors.iter().flat_map(|v| v.vector.iter().copied()).collect();
        let vector_array = FixedSizeListArray::try_new(item_field(), width, Arc::new(Float32Array::from(values)), None)
            .map_err(|e| ServiceError::Index(format!("Failed to build vector column: {e}")))?;

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(keys),
                Arc::new(modalities),
                Arc::new(metadata),
                Arc::new(vector_array),
            ],
        )
        .map_err(|e| ServiceError::Index(format!("Failed to build record batch: {e}")))
    }

    /// Parse search result rows into matches.
    fn record_batch_to_matches(batch: &RecordBatch) -> Result<Vec<IndexMatch>, ServiceError> {
        let keys = string_column(batch, KEY_COLUMN)?;
        let metadata = string_column(batch, METADATA_COLUMN)?;
        let distances = batch
            .column_by_name(DISTANCE_COLUMN)
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

        let mut matches = Vec::with_capacity(batch.num_rows());
        for i in 0..batch.num_rows() {
            let parsed: VectorMetadata = if metadata.is_null(i) {
                VectorMetadata::new()
            } else {
                serde_json::from_str(metadata.value(i)).unwrap_or_else(|e| {
                    tracing::warn!(key = keys.value(i), "unreadable metadata: {e}");
                    VectorMetadata::new()
                })
            };
            matches.push(IndexMatch {
                key: keys.value(i).to_string(),
                distance: distances.map_or(0.0, |d| d.value(i)),
                metadata: parsed,
            });
        }
        Ok(matches)
    }

    /// Extract `(key, vector)` rows from a key/vector projection.
    fn record_batch_to_vectors(batch: &RecordBatch) -> Result<Vec<(String, Vec<f32>)>, ServiceError> {
        let keys = string_column(batch, KEY_COLUMN)?;
        let vectors = batch
            .column_by_name(VECTOR_COLUMN)
            .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
            .ok_or_else(|| ServiceError::Index("vector column is not FixedSizeListArray".to_string()))?;

        let mut rows = Vec::with_capacity(batch.num_rows());
        for i in 0..batch.num_rows() {
            let value_array = vectors.value(i);
            let values = value_array
                .as_any()
                .downcast_ref::<Float32Array>()
                .ok_or_else(|| ServiceError::Index("vector values are not Float32Array".to_string()))?;
            rows.push((keys.value(i).to_string(), values.values().to_vec()));
        }
        Ok(rows)
    }
}

impl VectorIndex for LanceVectorIndex {
    fn metric(&self) -> DistanceMetric {
        DistanceMetric::Cosine
    }

    fn returns_vectors(&self) -> bool {
        true
    }

    async fn put(&self, vectors: &[StoredVector]) -> Result<(), ServiceError> {
        // Last write wins for a repeated (dimension, key).
        let mut by_dimension: BTreeMap<usize, BTreeMap<&str, &StoredVector>> = BTreeMap::new();
        for v in vectors {
            if v.vector.len() != v.dimension {
                return Err(ServiceError::Index(format!(
                    "vector {} has {} values but targets the {}d index",
                    v.key,
                    v.vector.len(),
                    v.dimension
                )));
            }
            by_dimension.entry(v.dimension).or_default().insert(v.key.as_str(), v);
        }

        let _guard = self.write_lock.lock().await;
        for (dimension, entries) in by_dimension {
            let table = self.store.table_or_create(dimension).await?;
            let batch_vectors: Vec<&StoredVector> = entries.values().copied().collect();

            table
                .delete(&key_predicate(entries.keys().copied()))
                .await
                .map_err(|e| ServiceError::Index(format!("Failed to replace existing keys: {e}")))?;

            let batch = Self::build_record_batch(dimension, &batch_vectors)?;
            let schema = batch.schema();
            table
                .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
                .execute()
                .await
                .map_err(|e| ServiceError::Index(format!("Failed to add vectors: {e}")))?;
            tracing::debug!(dimension, count = batch_vectors.len(), "vectors written");
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
        let Some(table) = self.store.table(dimension).await? else {
            tracing::debug!(index = %index_name(dimension), "index does not exist yet");
            return Ok(Vec::new());
        };

        let results = table
            .vector_search(vector)
            .map_err(|e| ServiceError::Index(format!("Vector search setup failed: {e}")))?
            .distance_type(lancedb::DistanceType::Cosine)
            .limit(top_k)
            .execute()
            .await
            .map_err(|e| ServiceError::Index(format!("Vector search failed: {e}")))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| ServiceError::Index(format!("Failed to collect results: {e}")))?;

        let mut matches = Vec::new();
        for batch in batches.iter().filter(|b| b.num_rows() > 0) {
            matches.extend(Self::record_batch_to_matches(batch)?);
        }
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn vectors(&self, dimension: usize, keys: &[String]) -> Result<HashMap<String, Vec<f32>>, ServiceError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let Some(table) = self.store.table(dimension).await? else {
            return Ok(HashMap::new());
        };

        let results = table
            .query()
            .only_if(key_predicate(keys.iter().map(String::as_str)))
            .select(Select::columns(&[KEY_COLUMN, VECTOR_COLUMN]))
            .execute()
            .await
            .map_err(|e| ServiceError::Index(format!("Vector lookup failed: {e}")))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| ServiceError::Index(format!("Failed to collect vectors: {e}")))?;

        let mut found = HashMap::with_capacity(keys.len());
        for batch in &batches {
            found.extend(Self::record_batch_to_vectors(batch)?);
        }
        Ok(found)
    }

    async fn count(&self, dimension: usize) -> Result<usize, ServiceError> {
        let Some(table) = self.store.table(dimension).await? else {
            return Ok(0);
        };
        table
            .count_rows(None)
            .await
            .map_err(|e| ServiceError::Index(format!("Failed to count rows: {e}")))
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, ServiceError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| ServiceError::Index(format!("result batch has no {name} column")))
}

/// `key IN ('a', 'b')` with single quotes escaped.
fn key_predicate<'a>(keys: impl Iterator<Item = &'a str>) -> String {
    let quoted: Vec<String> = keys.map(|k| format!("'{}'", k.replace('\'', "''"))).collect();
    format!("{KEY_COLUMN} IN ({})", quoted.join(", "))
}

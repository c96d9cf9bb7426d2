//! LanceDB connection holding one table per embedding dimension.
//!
//! The [`VectorIndex`](strata_core::vector::index::VectorIndex)
//! implementation on top of it lives in [`super::index`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use strata_types::error::ServiceError;
use strata_types::vector::index_name;

use super::schema::embedding_schema;

/// A LanceDB database directory. Tables are named by
/// [`index_name`](strata_types::vector::index_name) and created lazily on
/// first write.
pub struct LanceVectorStore {
    db: lancedb::Connection,
    base_path: PathBuf,
}

impl LanceVectorStore {
    /// Open or create a LanceDB vector store at the given path.
    ///
    /// Creates the directory if it does not exist.
    pub async fn new(base_path: PathBuf) -> Result<Self, lancedb::Error> {
        std::fs::create_dir_all(&base_path).map_err(|e| lancedb::Error::CreateDir {
            path: base_path.display().to_string(),
            source: e,
        })?;

        let uri = base_path
            .to_str()
            .ok_or_else(|| lancedb::Error::InvalidInput {
                message: format!("Path contains invalid UTF-8: {}", base_path.display()),
            })?;

        let db = lancedb::connect(uri).execute().await?;
        tracing::debug!(path = %base_path.display(), "vector store opened");

        Ok(Self { db, base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// The table for `dimension`, or `None` if nothing was ever written to it.
    pub async fn table(&self, dimension: usize) -> Result<Option<lancedb::Table>, ServiceError> {
        match self.db.open_table(index_name(dimension)).execute().await {
            Ok(table) => Ok(Some(table)),
            Err(lancedb::Error::TableNotFound { .. }) => Ok(None),
            Err(e) => Err(ServiceError::Index(format!(
                "Failed to open {}: {e}",
                index_name(dimension)
            ))),
        }
    }

    /// The table for `dimension`, created empty if missing.
    pub async fn table_or_create(&self, dimension: usize) -> Result<lancedb::Table, ServiceError> {
        if let Some(table) = self.table(dimension).await? {
            return Ok(table);
        }
        let width = dimension_width(dimension)?;
        let name = index_name(dimension);
        tracing::info!(index = %name, "creating dimension index");
        self.db
            .create_empty_table(name.clone(), Arc::new(embedding_schema(width)))
            .execute()
            .await
            .map_err(|e| ServiceError::Index(format!("Failed to create {name}: {e}")))
    }

    /// Dimensions that currently have a table, ascending.
    pub async fn dimensions(&self) -> Result<Vec<usize>, ServiceError> {
        let names = self
            .db
            .table_names()
            .execute()
            .await
            .map_err(|e| ServiceError::Index(format!("Failed to list tables: {e}")))?;
        let mut dimensions: Vec<usize> = names.iter().filter_map(|n| parse_index_name(n)).collect();
        dimensions.sort_unstable();
        Ok(dimensions)
    }
}

/// Arrow list width for a dimension.
pub(crate) fn dimension_width(dimension: usize) -> Result<i32, ServiceError> {
    i32::try_from(dimension)
        .ok()
        .filter(|d| *d > 0)
        .ok_or_else(|| ServiceError::Index(format!("invalid dimension {dimension}")))
}

/// `embeddings-256d` -> 256
fn parse_index_name(name: &str) -> Option<usize> {
    name.strip_prefix("embeddings-")?.strip_suffix('d')?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store(dir: &tempfile::TempDir) -> LanceVectorStore {
        LanceVectorStore::new(dir.path().join("vectors"))
            .await
            .expect("Failed to create vector store")
    }

    #[test]
    fn test_parse_index_name() {
        assert_eq!(parse_index_name("embeddings-3072d"), Some(3072));
        assert_eq!(parse_index_name(&index_name(384)), Some(384));
        assert_eq!(parse_index_name("memories"), None);
        assert_eq!(parse_index_name("embeddings-xd"), None);
    }

    #[tokio::test]
    async fn test_new_store_has_no_tables() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = store(&temp_dir).await;

        assert!(store.base_path().exists());
        assert!(store.dimensions().await.unwrap().is_empty());
        assert!(store.table(256).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_table_or_create_is_reused() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = store(&temp_dir).await;

        let table = store.table_or_create(256).await.expect("Failed to create table");
        assert_eq!(table.count_rows(None).await.expect("Failed to count rows"), 0);
        assert_eq!(table.name(), "embeddings-256d");

        store.table_or_create(256).await.expect("Failed to reopen table");
        store.table_or_create(1024).await.expect("Failed to create table");
        assert_eq!(store.dimensions().await.unwrap(), vec![256, 1024]);
    }

    #[tokio::test]
    async fn test_zero_dimension_is_rejected() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = store(&temp_dir).await;
        assert!(matches!(store.table_or_create(0).await, Err(ServiceError::Index(_))));
    }
}

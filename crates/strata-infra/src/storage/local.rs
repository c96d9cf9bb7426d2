//! Local filesystem blob store.
//!
//! Implements the `BlobStore` port with objects stored at
//! `{root}/{bucket}/{key}`:
//!
//! ```text
//! {root}/
//!   media-uploads/
//!     docs/report.pdf
//!     pdf-pages/docs/report/page_1.png
//!   strata-embeddings-output/
//!     docs_report_pdf_20260301120000/abc123/segmented-embedding-result.json
//! ```

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};

use strata_core::storage::blob_store::BlobStore;
use strata_types::error::ServiceError;
use strata_types::media::{BlobInfo, ObjectLocation};

use super::detect_mime;

#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path on disk for `location`. Rejects keys that would escape the bucket.
    fn object_path(&self, location: &ObjectLocation) -> Result<PathBuf, ServiceError> {
        let bucket = Path::new(&location.bucket);
        let key = Path::new(&location.key);
        let safe = |p: &Path| p.components().all(|c| matches!(c, Component::Normal(_)));
        if location.bucket.is_empty() || !safe(bucket) || !safe(key) {
            return Err(ServiceError::Request(format!("invalid object location: {location}")));
        }
        Ok(self.root.join(bucket).join(key))
    }

    /// Write an object, creating parent directories as needed.
    pub async fn put(&self, location: &ObjectLocation, bytes: &[u8]) -> Result<(), ServiceError> {
        let path = self.object_path(location)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ServiceError::Request(format!("Failed to create {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ServiceError::Request(format!("Failed to write {location}: {e}")))?;
        tracing::debug!(%location, size = bytes.len(), "object written");
        Ok(())
    }
}

fn io_error(location: &ObjectLocation, e: std::io::Error) -> ServiceError {
    if e.kind() == std::io::ErrorKind::NotFound {
        ServiceError::NotFound(location.uri())
    } else {
        ServiceError::Request(format!("{location}: {e}"))
    }
}

impl BlobStore for LocalBlobStore {
    async fn head(&self, location: &ObjectLocation) -> Result<BlobInfo, ServiceError> {
        let path = self.object_path(location)?;
        let meta = tokio::fs::metadata(&path).await.map_err(|e| io_error(location, e))?;
        if !meta.is_file() {
            return Err(ServiceError::NotFound(location.uri()));
        }
        let last_modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Ok(BlobInfo {
            size_bytes: meta.len(),
            last_modified,
            content_type: Some(detect_mime(location.file_name())),
        })
    }

    async fn get(&self, location: &ObjectLocation) -> Result<Vec<u8>, ServiceError> {
        let path = self.object_path(location)?;
        tokio::fs::read(&path).await.map_err(|e| io_error(location, e))
    }

    async fn list(&self, prefix: &ObjectLocation) -> Result<Vec<ObjectLocation>, ServiceError> {
        let bucket_root = self.object_path(&ObjectLocation::new(prefix.bucket.clone(), ""))?;
        // Only the directory part of the prefix needs walking.
        let start_dir = match prefix.key.rfind('/') {
            Some(idx) => bucket_root.join(&prefix.key[..idx]),
            None => bucket_root.clone(),
        };

        let mut keys = Vec::new();
        let mut pending = vec![start_dir];
        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(ServiceError::Request(format!("Failed to list {}: {e}", dir.display()))),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| ServiceError::Request(format!("Failed to list {}: {e}", dir.display())))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| ServiceError::Request(format!("{}: {e}", path.display())))?;
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&bucket_root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(&prefix.key) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys
            .into_iter()
            .map(|key| ObjectLocation::new(prefix.bucket.clone(), key))
            .collect())
    }
}

//! Index writer.
//!
//! Reads a completed job's manifest and segment files, derives every
//! configured dimension variant of each segment, and writes one stored vector
//! per variant. Bad segments are skipped; any index write failure is fatal
//! for the whole object.

use chrono::Utc;

use strata_types::error::IngestError;
use strata_types::job::EmbeddingJob;
use strata_types::media::ObjectLocation;
use strata_types::segment::{JobManifest, ManifestEntry, Modality, Segment, SegmentLine, SegmentPosition};
use strata_types::vector::StoredVector;

use crate::storage::box_blob_store::BoxBlobStore;
use crate::transform::derive_variants;
use crate::vector::box_index::BoxVectorIndex;

use super::metadata::build_metadata;

/// Writes the output of completed embedding jobs into the dimension indexes.
pub struct IndexWriter<'a> {
    blobs: &'a BoxBlobStore,
    index: &'a BoxVectorIndex,
    dimensions: &'a [usize],
}

impl<'a> IndexWriter<'a> {
    pub fn new(blobs: &'a BoxBlobStore, index: &'a BoxVectorIndex, dimensions: &'a [usize]) -> Self {
        Self {
            blobs,
            index,
            dimensions,
        }
    }

    /// Store every usable segment of a completed job.
    ///
    /// Returns the number of stored vectors (segments x dimensions).
    pub async fn store_job_output(&self, job: &EmbeddingJob) -> Result<usize, IngestError> {
        let manifest_location = job.manifest_location();
        let manifest = self.read_manifest(&manifest_location).await?;

        let mut stored = 0;
        for entry in manifest.embedding_results.iter().filter(|e| e.is_usable()) {
            stored += self.store_entry(job, entry).await?;
        }

        tracing::info!(
            object_id = %job.object.object_id,
            stored,
            dimensions = ?self.dimensions,
            "stored embedding variants"
        );
        Ok(stored)
    }

    async fn read_manifest(&self, location: &ObjectLocation) -> Result<JobManifest, IngestError> {
        let bytes = self
            .blobs
            .get(location)
            .await
            .map_err(|e| IngestError::Storage(format!("reading manifest {location}: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| IngestError::Storage(format!("parsing manifest {location}: {e}")))
    }

    async fn store_entry(&self, job: &EmbeddingJob, entry: &ManifestEntry) -> Result<usize, IngestError> {
        let modality: Modality = match entry.embedding_type.parse() {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(embedding_type = %entry.embedding_type, "skipping manifest entry: {e}");
                return Ok(0);
            }
        };
        let location: ObjectLocation = entry
            .output_file_uri
            .parse()
            .map_err(|e: String| IngestError::Storage(e))?;
        let bytes = self
            .blobs
            .get(&location)
            .await
            .map_err(|e| IngestError::Storage(format!("reading segments {location}: {e}")))?;
        let content = String::from_utf8_lossy(&bytes);

        let mut stored = 0;
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let parsed: SegmentLine = match serde_json::from_str(line) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(%location, line_no, "skipping unparseable segment line: {e}");
                    continue;
                }
            };
            if !parsed.is_success() {
                continue;
            }
            let mut segment = match parsed.into_segment(modality) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(%location, line_no, "skipping invalid segment: {e}");
                    continue;
                }
            };
            if let (Some(page), SegmentPosition::Whole) = (&job.object.page, &segment.position) {
                segment.position = SegmentPosition::Page {
                    page_number: page.page_number,
                    total_pages: page.total_pages,
                };
            }
            stored += self.store_segment(job, &segment).await?;
        }
        Ok(stored)
    }

    /// Derive and write all variants of one segment.
    ///
    /// A transform failure skips this segment only.
    pub async fn store_segment(&self, job: &EmbeddingJob, segment: &Segment) -> Result<usize, IngestError> {
        let variants = match derive_variants(&segment.vector, self.dimensions) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    object_id = %job.object.object_id,
                    segment = segment.index,
                    "skipping segment: {e}"
                );
                return Ok(0);
            }
        };

        let processed_at = Utc::now();
        let key = StoredVector::key_for(&job.object.object_id, segment.index);
        let vectors: Vec<StoredVector> = variants
            .into_iter()
            .map(|(dimension, vector)| StoredVector {
                key: key.clone(),
                dimension,
                vector,
                metadata: build_metadata(&job.object, segment, dimension, processed_at),
            })
            .collect();

        self.index
            .put(&vectors)
            .await
            .map_err(|e| IngestError::Storage(format!("writing {key}: {e}")))?;
        Ok(vectors.len())
    }
}

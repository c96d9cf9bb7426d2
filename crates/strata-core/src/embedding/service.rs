//! Embedding service trait.
//!
//! Defines the interface to the external embedding computation service: an
//! asynchronous bulk path (submit a segmented job, poll its status) and a
//! synchronous path for embedding a single query.
//! Implementations (e.g., Bedrock) live in strata-infra.

use strata_types::error::ServiceError;
use strata_types::job::{JobRequest, JobStatusReport};
use strata_types::media::ObjectLocation;

/// Trait for embedding computation backends.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in strata-infra.
pub trait EmbeddingService: Send + Sync {
    /// Model identifier used for both job and query embeddings.
    fn model_id(&self) -> &str;

    /// Submit an asynchronous segmented-embedding job.
    ///
    /// The service writes its output under `output`. Returns the opaque job
    /// handle used for status checks.
    fn start_job(
        &self,
        request: &JobRequest,
        output: &ObjectLocation,
    ) -> impl std::future::Future<Output = Result<String, ServiceError>> + Send;

    /// Check the status of a previously submitted job.
    fn job_status(
        &self,
        handle: &str,
    ) -> impl std::future::Future<Output = Result<JobStatusReport, ServiceError>> + Send;

    /// Embed a query string synchronously at the given dimension.
    fn embed_text(
        &self,
        text: &str,
        dimension: usize,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, ServiceError>> + Send;
}

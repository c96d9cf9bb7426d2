//! BoxEmbeddingService -- object-safe dynamic dispatch wrapper for EmbeddingService.
//!
//! Same blanket-impl pattern as the other port wrappers:
//! 1. Define an object-safe `EmbeddingServiceDyn` trait with boxed futures
//! 2. Blanket-impl `EmbeddingServiceDyn` for all `T: EmbeddingService`
//! 3. `BoxEmbeddingService` wraps `Box<dyn EmbeddingServiceDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use strata_types::error::ServiceError;
use strata_types::job::{JobRequest, JobStatusReport};
use strata_types::media::ObjectLocation;

use super::service::EmbeddingService;

/// Object-safe version of [`EmbeddingService`] with boxed futures.
pub trait EmbeddingServiceDyn: Send + Sync {
    fn model_id_dyn(&self) -> &str;

    fn start_job_boxed<'a>(
        &'a self,
        request: &'a JobRequest,
        output: &'a ObjectLocation,
    ) -> Pin<Box<dyn Future<Output = Result<String, ServiceError>> + Send + 'a>>;

    fn job_status_boxed<'a>(
        &'a self,
        handle: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<JobStatusReport, ServiceError>> + Send + 'a>>;

    fn embed_text_boxed<'a>(
        &'a self,
        text: &'a str,
        dimension: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, ServiceError>> + Send + 'a>>;
}

impl<T: EmbeddingService> EmbeddingServiceDyn for T {
    fn model_id_dyn(&self) -> &str {
        self.model_id()
    }

    fn start_job_boxed<'a>(
        &'a self,
        request: &'a JobRequest,
        output: &'a ObjectLocation,
    ) -> Pin<Box<dyn Future<Output = Result<String, ServiceError>> + Send + 'a>> {
        Box::pin(self.start_job(request, output))
    }

    fn job_status_boxed<'a>(
        &'a self,
        handle: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<JobStatusReport, ServiceError>> + Send + 'a>> {
        Box::pin(self.job_status(handle))
    }

    fn embed_text_boxed<'a>(
        &'a self,
        text: &'a str,
        dimension: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, ServiceError>> + Send + 'a>> {
        Box::pin(self.embed_text(text, dimension))
    }
}

/// Type-erased embedding service.
///
/// Since `EmbeddingService` uses RPITIT it cannot be a trait object directly;
/// this wrapper provides the same methods over a boxed `EmbeddingServiceDyn`.
pub struct BoxEmbeddingService {
    inner: Box<dyn EmbeddingServiceDyn + Send + Sync>,
}

impl BoxEmbeddingService {
    pub fn new<T: EmbeddingService + 'static>(service: T) -> Self {
        Self {
            inner: Box::new(service),
        }
    }

    pub fn model_id(&self) -> &str {
        self.inner.model_id_dyn()
    }

    pub async fn start_job(
        &self,
        request: &JobRequest,
        output: &ObjectLocation,
    ) -> Result<String, ServiceError> {
        self.inner.start_job_boxed(request, output).await
    }

    pub async fn job_status(&self, handle: &str) -> Result<JobStatusReport, ServiceError> {
        self.inner.job_status_boxed(handle).await
    }

    pub async fn embed_text(&self, text: &str, dimension: usize) -> Result<Vec<f32>, ServiceError> {
        self.inner.embed_text_boxed(text, dimension).await
    }
}

//! Document extractor trait and its type-erased wrapper.
//!
//! Format-specific rendering (PDF to page images, DOCX to text) happens
//! outside this crate; the extractor only resolves a document to the
//! artifacts that were rendered for it.

use std::future::Future;
use std::pin::Pin;

use strata_types::error::ServiceError;
use strata_types::media::{ObjectLocation, SourceObject};

/// Resolves documents to their derived artifacts.
pub trait DocumentExtractor: Send + Sync {
    /// Rendered page images of a scanned document, in page order.
    fn pages(
        &self,
        document: &SourceObject,
    ) -> impl Future<Output = Result<Vec<ObjectLocation>, ServiceError>> + Send;

    /// Location of the text extracted from a word-processing document.
    fn extracted_text(
        &self,
        document: &SourceObject,
    ) -> impl Future<Output = Result<ObjectLocation, ServiceError>> + Send;
}

pub trait DocumentExtractorDyn: Send + Sync {
    fn pages_boxed<'a>(
        &'a self,
        document: &'a SourceObject,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ObjectLocation>, ServiceError>> + Send + 'a>>;

    fn extracted_text_boxed<'a>(
        &'a self,
        document: &'a SourceObject,
    ) -> Pin<Box<dyn Future<Output = Result<ObjectLocation, ServiceError>> + Send + 'a>>;
}

impl<T: DocumentExtractor> DocumentExtractorDyn for T {
    fn pages_boxed<'a>(
        &'a self,
        document: &'a SourceObject,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ObjectLocation>, ServiceError>> + Send + 'a>> {
        Box::pin(self.pages(document))
    }

    fn extracted_text_boxed<'a>(
        &'a self,
        document: &'a SourceObject,
    ) -> Pin<Box<dyn Future<Output = Result<ObjectLocation, ServiceError>> + Send + 'a>> {
        Box::pin(self.extracted_text(document))
    }
}

/// Type-erased document extractor.
pub struct BoxDocumentExtractor {
    inner: Box<dyn DocumentExtractorDyn + Send + Sync>,
}

impl BoxDocumentExtractor {
    pub fn new<T: DocumentExtractor + 'static>(extractor: T) -> Self {
        Self {
            inner: Box::new(extractor),
        }
    }

    pub async fn pages(&self, document: &SourceObject) -> Result<Vec<ObjectLocation>, ServiceError> {
        self.inner.pages_boxed(document).await
    }

    pub async fn extracted_text(&self, document: &SourceObject) -> Result<ObjectLocation, ServiceError> {
        self.inner.extracted_text_boxed(document).await
    }
}

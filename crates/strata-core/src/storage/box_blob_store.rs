//! BoxBlobStore -- object-safe dynamic dispatch wrapper for BlobStore.

use std::future::Future;
use std::pin::Pin;

use strata_types::error::ServiceError;
use strata_types::media::{BlobInfo, ObjectLocation};

use super::blob_store::BlobStore;

/// Object-safe version of [`BlobStore`] with boxed futures.
pub trait BlobStoreDyn: Send + Sync {
    fn head_boxed<'a>(
        &'a self,
        location: &'a ObjectLocation,
    ) -> Pin<Box<dyn Future<Output = Result<BlobInfo, ServiceError>> + Send + 'a>>;

    fn get_boxed<'a>(
        &'a self,
        location: &'a ObjectLocation,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, ServiceError>> + Send + 'a>>;

    fn list_boxed<'a>(
        &'a self,
        prefix: &'a ObjectLocation,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ObjectLocation>, ServiceError>> + Send + 'a>>;
}

impl<T: BlobStore> BlobStoreDyn for T {
    fn head_boxed<'a>(
        &'a self,
        location: &'a ObjectLocation,
    ) -> Pin<Box<dyn Future<Output = Result<BlobInfo, ServiceError>> + Send + 'a>> {
        Box::pin(self.head(location))
    }

    fn get_boxed<'a>(
        &'a self,
        location: &'a ObjectLocation,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, ServiceError>> + Send + 'a>> {
        Box::pin(self.get(location))
    }

    fn list_boxed<'a>(
        &'a self,
        prefix: &'a ObjectLocation,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ObjectLocation>, ServiceError>> + Send + 'a>> {
        Box::pin(self.list(prefix))
    }
}

/// Type-erased blob store.
pub struct BoxBlobStore {
    inner: Box<dyn BlobStoreDyn + Send + Sync>,
}

impl BoxBlobStore {
    pub fn new<T: BlobStore + 'static>(store: T) -> Self {
        Self {
            inner: Box::new(store),
        }
    }

    pub async fn head(&self, location: &ObjectLocation) -> Result<BlobInfo, ServiceError> {
        self.inner.head_boxed(location).await
    }

    pub async fn get(&self, location: &ObjectLocation) -> Result<Vec<u8>, ServiceError> {
        self.inner.get_boxed(location).await
    }

    pub async fn list(&self, prefix: &ObjectLocation) -> Result<Vec<ObjectLocation>, ServiceError> {
        self.inner.list_boxed(prefix).await
    }
}

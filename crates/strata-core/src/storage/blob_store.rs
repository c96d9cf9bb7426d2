//! Blob store trait.
//!
//! Read-side interface to durable object storage: source uploads, job
//! output manifests and segment files, and derived document artifacts.
//! Implementations live in strata-infra.

use strata_types::error::ServiceError;
use strata_types::media::{BlobInfo, ObjectLocation};

/// Trait for reading objects from blob storage.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait BlobStore: Send + Sync {
    /// Object attributes without its content.
    fn head(
        &self,
        location: &ObjectLocation,
    ) -> impl std::future::Future<Output = Result<BlobInfo, ServiceError>> + Send;

    /// Full object content.
    fn get(
        &self,
        location: &ObjectLocation,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, ServiceError>> + Send;

    /// All objects whose key starts with `prefix.key`, sorted by key.
    fn list(
        &self,
        prefix: &ObjectLocation,
    ) -> impl std::future::Future<Output = Result<Vec<ObjectLocation>, ServiceError>> + Send;
}

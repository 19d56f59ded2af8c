//! Storage traits/interfaces for object store operations.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::parts::CopyPart;
use crate::types::{DeleteOutcome, ObjectPage, StorageTier, TagSet};

/// Low-level object store operations - implemented by each backend.
///
/// Every call addresses one bucket explicitly; implementations hold no
/// per-run state, so one client can serve several runs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one page of a listing.
    ///
    /// # Arguments
    /// * `bucket` - Bucket to list
    /// * `prefix` - Optional key prefix restricting the listing
    /// * `continuation_token` - Token from the previous page, None for the first page
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, StorageError>;

    /// Delete up to 1000 keys in one request.
    ///
    /// Per-key failures are reported in the outcome. `Err` means the request
    /// itself failed and nothing is known about which keys were deleted.
    async fn delete_objects(
        &self,
        bucket: &str,
        keys: &[String],
    ) -> Result<DeleteOutcome, StorageError>;

    /// Copy an object onto itself with a new storage class, keeping its metadata.
    async fn copy_object_in_place(
        &self,
        bucket: &str,
        key: &str,
        target_tier: &StorageTier,
    ) -> Result<(), StorageError>;

    /// Copy an object onto itself in ranged parts with a new storage class.
    ///
    /// Implementations must only make the new object visible once every
    /// part succeeded; on failure the original object stays as it was.
    async fn chunked_copy(
        &self,
        bucket: &str,
        key: &str,
        target_tier: &StorageTier,
        parts: &[CopyPart],
    ) -> Result<(), StorageError>;

    /// Read the tag set of an object (possibly empty).
    async fn get_object_tags(&self, bucket: &str, key: &str) -> Result<TagSet, StorageError>;

    /// Replace the tag set of an object.
    async fn put_object_tags(
        &self,
        bucket: &str,
        key: &str,
        tags: &TagSet,
    ) -> Result<(), StorageError>;
}

//! In-place storage class migration.

use rusty_lifecycle_storage::{
    copy_strategy, plan_copy_parts, CopyPart, CopyStrategy, ItemFailure, ObjectDescriptor,
    ObjectStore, StorageError, StorageTier, TagSet,
};

/// What happened to an object's tags during a migration.
#[derive(Debug, Clone)]
pub enum TagReplication {
    /// The object had no tags.
    Empty,
    /// This many tags were re-applied after the copy.
    Copied(usize),
    /// Tags could not be read or written. The copy itself succeeded.
    Failed(StorageError),
}

/// A completed migration.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub key: String,
    pub size: u64,
    pub strategy: CopyStrategy,
    pub tags: TagReplication,
}

/// Moves objects into another storage class by copying them onto themselves.
///
/// Objects up to `multipart_threshold` bytes are copied with one request;
/// larger ones are copied in ranged parts through the store's multipart
/// primitive, which leaves the object untouched unless every part succeeds.
pub struct TierMigrator<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    bucket: String,
    multipart_threshold: u64,
    chunk_size: u64,
}

impl<'a, S: ObjectStore + ?Sized> TierMigrator<'a, S> {
    /// Create a migrator.
    ///
    /// # Arguments
    /// * `store` - Store holding the objects
    /// * `bucket` - Bucket of the objects
    /// * `multipart_threshold` - Largest size copied with a single request
    /// * `chunk_size` - Requested part size for multipart copies
    pub fn new(
        store: &'a S,
        bucket: impl Into<String>,
        multipart_threshold: u64,
        chunk_size: u64,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            multipart_threshold,
            chunk_size,
        }
    }

    /// Migrate one object into `target_tier`.
    ///
    /// The tag set is read before the copy, because a completed multipart copy
    /// produces an object without tags, and re-applied afterwards when
    /// non-empty. Tag problems are reported in the result and never fail the
    /// migration.
    ///
    /// # Errors
    /// Returns an [`ItemFailure`] if the copy failed. The object keeps its
    /// previous storage class in that case.
    pub async fn migrate(
        &self,
        obj: &ObjectDescriptor,
        target_tier: &StorageTier,
    ) -> Result<MigrationReport, ItemFailure> {
        let tags: Result<TagSet, StorageError> =
            self.store.get_object_tags(&self.bucket, &obj.key).await;

        let strategy: CopyStrategy = copy_strategy(obj.size, self.multipart_threshold);
        let copied: Result<(), StorageError> = match strategy {
            CopyStrategy::SingleRequest => {
                self.store
                    .copy_object_in_place(&self.bucket, &obj.key, target_tier)
                    .await
            }
            CopyStrategy::Chunked => {
                let parts: Vec<CopyPart> = plan_copy_parts(obj.size, self.chunk_size);
                log::debug!(
                    "Copying {} ({} bytes) in {} parts",
                    obj.key,
                    obj.size,
                    parts.len()
                );
                self.store
                    .chunked_copy(&self.bucket, &obj.key, target_tier, &parts)
                    .await
            }
        };

        if let Err(e) = copied {
            log::warn!("Failed to archive {}: {}", obj.key, e);
            return Err(ItemFailure::new(obj.key.clone(), e));
        }
        log::info!("Archived {} to {}", obj.key, target_tier);

        let tags: TagReplication = self.replicate_tags(&obj.key, tags).await;
        Ok(MigrationReport {
            key: obj.key.clone(),
            size: obj.size,
            strategy,
            tags,
        })
    }

    async fn replicate_tags(
        &self,
        key: &str,
        snapshot: Result<TagSet, StorageError>,
    ) -> TagReplication {
        let tags: TagSet = match snapshot {
            Ok(tags) if tags.is_empty() => return TagReplication::Empty,
            Ok(tags) => tags,
            Err(e) => {
                log::warn!("Could not read tags of {}: {}", key, e);
                return TagReplication::Failed(e);
            }
        };

        match self.store.put_object_tags(&self.bucket, key, &tags).await {
            Ok(()) => TagReplication::Copied(tags.len()),
            Err(e) => {
                log::warn!("Could not restore tags of {}: {}", key, e);
                TagReplication::Failed(e)
            }
        }
    }
}

//! In-memory object store.
//!
//! `MemoryObjectStore` keeps buckets in process memory. It mirrors the S3
//! behaviors the lifecycle engine depends on (paged listings, partial bulk
//! deletes, copy-in-place keeping tags, multipart copies dropping them) and
//! records every request so callers can inspect what was sent. Failures can
//! be injected per key or per operation.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusty_lifecycle_common::{key_matches_prefix, MAX_DELETE_BATCH_SIZE};

use crate::error::StorageError;
use crate::parts::CopyPart;
use crate::traits::ObjectStore;
use crate::types::{DeleteOutcome, ObjectDescriptor, ObjectPage, RejectedKey, StorageTier, TagSet};

/// Default number of objects per listing page (S3's own maximum).
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// A request received by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRequest {
    ListPage { prefix: Option<String> },
    DeleteObjects { keys: Vec<String> },
    CopyInPlace { key: String, tier: StorageTier },
    ChunkedCopy { key: String, tier: StorageTier, parts: usize },
    GetTags { key: String },
    PutTags { key: String, tags: TagSet },
}

#[derive(Debug, Clone)]
struct StoredObject {
    descriptor: ObjectDescriptor,
    tags: TagSet,
}

#[derive(Debug, Default)]
struct Failures {
    list_after_pages: Option<u64>,
    delete_requests: bool,
    rejected_deletes: HashSet<String>,
    copies: HashSet<String>,
    chunked_part: Option<i32>,
    tags: HashSet<String>,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, BTreeMap<String, StoredObject>>,
    requests: Vec<StoreRequest>,
    list_calls: u64,
    failures: Failures,
}

/// Object store held entirely in memory.
#[derive(Debug)]
pub struct MemoryObjectStore {
    state: Mutex<State>,
    page_size: usize,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the number of objects returned per listing page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert or replace an object.
    pub fn insert(&self, bucket: &str, descriptor: ObjectDescriptor) {
        self.insert_with_tags(bucket, descriptor, Vec::new());
    }

    /// Insert or replace an object together with its tag set.
    pub fn insert_with_tags(&self, bucket: &str, descriptor: ObjectDescriptor, tags: TagSet) {
        let mut state = self.lock();
        state
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(descriptor.key.clone(), StoredObject { descriptor, tags });
    }

    /// Look up an object.
    pub fn get(&self, bucket: &str, key: &str) -> Option<ObjectDescriptor> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|stored| stored.descriptor.clone())
    }

    /// Current tag set of an object.
    pub fn tags(&self, bucket: &str, key: &str) -> Option<TagSet> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|stored| stored.tags.clone())
    }

    /// Number of objects in a bucket.
    pub fn len(&self, bucket: &str) -> usize {
        self.lock().buckets.get(bucket).map_or(0, BTreeMap::len)
    }

    /// Whether a bucket holds no objects.
    pub fn is_empty(&self, bucket: &str) -> bool {
        self.len(bucket) == 0
    }

    /// All requests received so far, in order.
    pub fn requests(&self) -> Vec<StoreRequest> {
        self.lock().requests.clone()
    }

    /// Key counts of every bulk delete request received.
    pub fn delete_batch_sizes(&self) -> Vec<usize> {
        self.lock()
            .requests
            .iter()
            .filter_map(|r| match r {
                StoreRequest::DeleteObjects { keys } => Some(keys.len()),
                _ => None,
            })
            .collect()
    }

    /// Fail every listing request after `pages` pages have been served.
    pub fn fail_list_after_pages(&self, pages: u64) {
        self.lock().failures.list_after_pages = Some(pages);
    }

    /// Fail every bulk delete request at the transport level.
    pub fn fail_delete_requests(&self) {
        self.lock().failures.delete_requests = true;
    }

    /// Reject deletion of `key` inside otherwise successful bulk deletes.
    pub fn reject_delete(&self, key: impl Into<String>) {
        self.lock().failures.rejected_deletes.insert(key.into());
    }

    /// Fail every copy (single or chunked) of `key`.
    pub fn fail_copy(&self, key: impl Into<String>) {
        self.lock().failures.copies.insert(key.into());
    }

    /// Fail chunked copies when they reach `part_number`.
    pub fn fail_chunked_part(&self, part_number: i32) {
        self.lock().failures.chunked_part = Some(part_number);
    }

    /// Fail tag reads and writes for `key`.
    pub fn fail_tags(&self, key: impl Into<String>) {
        self.lock().failures.tags.insert(key.into());
    }
}

fn not_found(bucket: &str, key: &str) -> StorageError {
    StorageError::NotFound {
        bucket: bucket.to_string(),
        key: key.to_string(),
    }
}

fn object_mut<'s>(
    state: &'s mut State,
    bucket: &str,
    key: &str,
) -> Result<&'s mut StoredObject, StorageError> {
    state
        .buckets
        .get_mut(bucket)
        .and_then(|objects| objects.get_mut(key))
        .ok_or_else(|| not_found(bucket, key))
}

fn check_parts_cover(key: &str, size: u64, parts: &[CopyPart]) -> Result<(), StorageError> {
    let mut expected_offset: u64 = 0;
    for (i, part) in parts.iter().enumerate() {
        if part.part_number != i as i32 + 1 || part.offset != expected_offset || part.length == 0 {
            return Err(StorageError::InvalidRequest {
                message: format!("Part {} of {} is out of sequence", part.part_number, key),
            });
        }
        expected_offset += part.length;
    }
    if expected_offset != size {
        return Err(StorageError::InvalidRequest {
            message: format!(
                "Parts of {} cover {} bytes, object has {}",
                key, expected_offset, size
            ),
        });
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, StorageError> {
        let mut state = self.lock();
        state.requests.push(StoreRequest::ListPage {
            prefix: prefix.map(str::to_string),
        });

        if let Some(limit) = state.failures.list_after_pages {
            if state.list_calls >= limit {
                return Err(StorageError::network("listing unavailable"));
            }
        }
        state.list_calls += 1;

        let objects = match state.buckets.get(bucket) {
            Some(objects) => objects,
            None => return Ok(ObjectPage::default()),
        };

        // The token is the last key of the previous page; keys are kept sorted.
        let mut page: Vec<ObjectDescriptor> = objects
            .values()
            .filter(|o| key_matches_prefix(&o.descriptor.key, prefix))
            .filter(|o| continuation_token.map_or(true, |t| o.descriptor.key.as_str() > t))
            .take(self.page_size + 1)
            .map(|o| o.descriptor.clone())
            .collect();

        let next_continuation_token: Option<String> = if page.len() > self.page_size {
            page.truncate(self.page_size);
            page.last().map(|o| o.key.clone())
        } else {
            None
        };

        Ok(ObjectPage {
            objects: page,
            next_continuation_token,
        })
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        keys: &[String],
    ) -> Result<DeleteOutcome, StorageError> {
        let mut state = self.lock();
        state.requests.push(StoreRequest::DeleteObjects {
            keys: keys.to_vec(),
        });

        if keys.len() > MAX_DELETE_BATCH_SIZE {
            return Err(StorageError::InvalidRequest {
                message: format!(
                    "{} keys in one delete request, limit is {}",
                    keys.len(),
                    MAX_DELETE_BATCH_SIZE
                ),
            });
        }
        if state.failures.delete_requests {
            return Err(StorageError::network("delete request failed"));
        }

        let mut outcome = DeleteOutcome::default();
        for key in keys {
            if state.failures.rejected_deletes.contains(key) {
                outcome.rejected.push(RejectedKey {
                    key: key.clone(),
                    code: "AccessDenied".to_string(),
                    message: "Access Denied".to_string(),
                });
                continue;
            }
            // S3 reports deleting a missing key as success.
            if let Some(objects) = state.buckets.get_mut(bucket) {
                objects.remove(key);
            }
            outcome.deleted.push(key.clone());
        }

        Ok(outcome)
    }

    async fn copy_object_in_place(
        &self,
        bucket: &str,
        key: &str,
        target_tier: &StorageTier,
    ) -> Result<(), StorageError> {
        let mut state = self.lock();
        state.requests.push(StoreRequest::CopyInPlace {
            key: key.to_string(),
            tier: target_tier.clone(),
        });

        if state.failures.copies.contains(key) {
            return Err(StorageError::network(format!("copy of {} failed", key)));
        }

        let object = object_mut(&mut state, bucket, key)?;
        object.descriptor.tier = target_tier.clone();
        object.descriptor.last_modified = Utc::now();
        Ok(())
    }

    async fn chunked_copy(
        &self,
        bucket: &str,
        key: &str,
        target_tier: &StorageTier,
        parts: &[CopyPart],
    ) -> Result<(), StorageError> {
        let mut state = self.lock();
        state.requests.push(StoreRequest::ChunkedCopy {
            key: key.to_string(),
            tier: target_tier.clone(),
            parts: parts.len(),
        });

        if state.failures.copies.contains(key) {
            return Err(StorageError::network(format!("copy of {} failed", key)));
        }
        if let Some(failing) = state.failures.chunked_part {
            if parts.iter().any(|p| p.part_number == failing) {
                return Err(StorageError::MultipartCopyFailed {
                    key: key.to_string(),
                    part_number: failing,
                    message: "injected part failure".to_string(),
                });
            }
        }

        let object = object_mut(&mut state, bucket, key)?;
        check_parts_cover(key, object.descriptor.size, parts)?;

        // A completed multipart upload is a new object: tags are not carried over.
        object.descriptor.tier = target_tier.clone();
        object.descriptor.last_modified = Utc::now();
        object.tags.clear();
        Ok(())
    }

    async fn get_object_tags(&self, bucket: &str, key: &str) -> Result<TagSet, StorageError> {
        let mut state = self.lock();
        state.requests.push(StoreRequest::GetTags {
            key: key.to_string(),
        });

        if state.failures.tags.contains(key) {
            return Err(StorageError::AccessDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: "GetObjectTagging denied".to_string(),
            });
        }

        Ok(object_mut(&mut state, bucket, key)?.tags.clone())
    }

    async fn put_object_tags(
        &self,
        bucket: &str,
        key: &str,
        tags: &TagSet,
    ) -> Result<(), StorageError> {
        let mut state = self.lock();
        state.requests.push(StoreRequest::PutTags {
            key: key.to_string(),
            tags: tags.clone(),
        });

        if state.failures.tags.contains(key) {
            return Err(StorageError::AccessDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: "PutObjectTagging denied".to_string(),
            });
        }

        object_mut(&mut state, bucket, key)?.tags = tags.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::plan_copy_parts;
    use crate::types::Tag;
    use chrono::{TimeZone, Utc};

    fn object(key: &str, size: u64) -> ObjectDescriptor {
        let when = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
        ObjectDescriptor::new(key, when, size, StorageTier::Standard)
    }

    #[tokio::test]
    async fn test_list_pages_with_tokens() {
        let store = MemoryObjectStore::new().with_page_size(2);
        for key in ["a", "b", "c"] {
            store.insert("bkt", object(key, 1));
        }

        let first = store.list_objects_page("bkt", None, None).await.unwrap();
        assert_eq!(first.objects.len(), 2);
        assert_eq!(first.next_continuation_token.as_deref(), Some("b"));

        let second = store
            .list_objects_page("bkt", None, Some("b"))
            .await
            .unwrap();
        assert_eq!(second.objects.len(), 1);
        assert_eq!(second.objects[0].key, "c");
        assert!(second.next_continuation_token.is_none());
    }

    #[tokio::test]
    async fn test_delete_partitions_rejections() {
        let store = MemoryObjectStore::new();
        store.insert("bkt", object("keep", 1));
        store.insert("bkt", object("drop", 1));
        store.reject_delete("keep");

        let outcome = store
            .delete_objects("bkt", &["keep".to_string(), "drop".to_string()])
            .await
            .unwrap();

        assert_eq!(outcome.deleted, vec!["drop".to_string()]);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].key, "keep");
        assert!(store.get("bkt", "keep").is_some());
        assert!(store.get("bkt", "drop").is_none());
    }

    #[tokio::test]
    async fn test_delete_rejects_oversized_batch() {
        let store = MemoryObjectStore::new();
        let keys: Vec<String> = (0..1001).map(|i| i.to_string()).collect();
        let result = store.delete_objects("bkt", &keys).await;
        assert!(matches!(result, Err(StorageError::InvalidRequest { .. })));
    }

    #[tokio::test]
    async fn test_copy_in_place_keeps_tags() {
        let store = MemoryObjectStore::new();
        store.insert_with_tags("bkt", object("k", 1), vec![Tag::new("team", "data")]);

        store
            .copy_object_in_place("bkt", "k", &StorageTier::Glacier)
            .await
            .unwrap();

        assert_eq!(store.get("bkt", "k").unwrap().tier, StorageTier::Glacier);
        assert_eq!(store.tags("bkt", "k").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_chunked_copy_drops_tags_and_validates_parts() {
        let size: u64 = 20 * 1024 * 1024;
        let store = MemoryObjectStore::new();
        store.insert_with_tags("bkt", object("big", size), vec![Tag::new("a", "b")]);

        let bad_parts = plan_copy_parts(size - 1, 5 * 1024 * 1024);
        let result = store
            .chunked_copy("bkt", "big", &StorageTier::Glacier, &bad_parts)
            .await;
        assert!(matches!(result, Err(StorageError::InvalidRequest { .. })));
        assert_eq!(store.get("bkt", "big").unwrap().tier, StorageTier::Standard);

        let parts = plan_copy_parts(size, 5 * 1024 * 1024);
        store
            .chunked_copy("bkt", "big", &StorageTier::Glacier, &parts)
            .await
            .unwrap();
        assert_eq!(store.get("bkt", "big").unwrap().tier, StorageTier::Glacier);
        assert!(store.tags("bkt", "big").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_part_leaves_object_untouched() {
        let size: u64 = 20 * 1024 * 1024;
        let store = MemoryObjectStore::new();
        store.insert("bkt", object("big", size));
        store.fail_chunked_part(3);

        let parts = plan_copy_parts(size, 5 * 1024 * 1024);
        let result = store
            .chunked_copy("bkt", "big", &StorageTier::DeepArchive, &parts)
            .await;

        assert!(matches!(
            result,
            Err(StorageError::MultipartCopyFailed { part_number: 3, .. })
        ));
        assert_eq!(store.get("bkt", "big").unwrap().tier, StorageTier::Standard);
    }
}

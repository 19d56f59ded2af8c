//! Bulk deletion with bounded batches.

use std::collections::HashSet;

use rusty_lifecycle_storage::{DeleteOutcome, ObjectStore, RejectedKey};

use crate::error::RunError;

/// Result of one flushed batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Number of keys sent in the request.
    pub requested: usize,
    /// Keys the store confirmed as deleted, in response order.
    pub deleted: Vec<String>,
    /// Keys the store refused to delete.
    pub rejected: Vec<RejectedKey>,
}

/// Accumulates keys and deletes them in batches of at most `capacity`.
///
/// A batch is sent as soon as it is full, so the pending batch never grows
/// beyond `capacity`. [`BatchDeleter::finish`] sends whatever is left.
pub struct BatchDeleter<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    bucket: String,
    capacity: usize,
    pending: Vec<String>,
    batches_sent: u64,
}

impl<'a, S: ObjectStore + ?Sized> BatchDeleter<'a, S> {
    /// Create a deleter for `bucket`.
    ///
    /// # Arguments
    /// * `store` - Store receiving the bulk delete requests
    /// * `bucket` - Bucket the keys belong to
    /// * `capacity` - Maximum keys per request (at least 1)
    pub fn new(store: &'a S, bucket: impl Into<String>, capacity: usize) -> Self {
        let capacity: usize = capacity.max(1);
        Self {
            store,
            bucket: bucket.into(),
            capacity,
            pending: Vec::with_capacity(capacity),
            batches_sent: 0,
        }
    }

    /// Number of keys waiting to be sent.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Number of bulk delete requests sent so far.
    pub fn batches_sent(&self) -> u64 {
        self.batches_sent
    }

    /// Queue `key` for deletion, sending the batch if it became full.
    ///
    /// # Returns
    /// The report of the batch that was sent, if any.
    ///
    /// # Errors
    /// Returns [`RunError::BatchDelete`] if the bulk request itself failed. The
    /// keys of that batch are dropped from the deleter.
    pub async fn offer(&mut self, key: String) -> Result<Option<BatchReport>, RunError> {
        self.pending.push(key);
        if self.pending.len() >= self.capacity {
            return self.flush().await.map(Some);
        }
        Ok(None)
    }

    /// Send the remaining keys, if any.
    pub async fn finish(&mut self) -> Result<Option<BatchReport>, RunError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        self.flush().await.map(Some)
    }

    async fn flush(&mut self) -> Result<BatchReport, RunError> {
        let keys: Vec<String> = std::mem::take(&mut self.pending);
        self.batches_sent += 1;

        log::debug!(
            "Deleting batch {} of {} keys from {}",
            self.batches_sent,
            keys.len(),
            self.bucket
        );

        let outcome: DeleteOutcome = self
            .store
            .delete_objects(&self.bucket, &keys)
            .await
            .map_err(|source| RunError::BatchDelete {
                keys: keys.len(),
                source,
            })?;
        Ok(reconcile(&keys, outcome))
    }
}

/// Keep only confirmations for keys that were actually requested.
fn reconcile(requested: &[String], outcome: DeleteOutcome) -> BatchReport {
    let sent: HashSet<&str> = requested.iter().map(String::as_str).collect();

    let mut deleted: Vec<String> = Vec::with_capacity(outcome.deleted.len());
    for key in outcome.deleted {
        if sent.contains(key.as_str()) {
            deleted.push(key);
        } else {
            log::warn!("Store confirmed deletion of unrequested key {}", key);
        }
    }

    for rejected in &outcome.rejected {
        log::warn!(
            "Failed to delete {}: {} ({})",
            rejected.key,
            rejected.message,
            rejected.code
        );
    }

    let accounted: usize = deleted.len() + outcome.rejected.len();
    if accounted < requested.len() {
        log::warn!(
            "{} of {} keys were neither confirmed nor rejected",
            requested.len() - accounted,
            requested.len()
        );
    }

    BatchReport {
        requested: requested.len(),
        deleted,
        rejected: outcome.rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rusty_lifecycle_storage::{MemoryObjectStore, ObjectDescriptor, StorageTier};

    fn store_with(n: usize) -> MemoryObjectStore {
        let store = MemoryObjectStore::new();
        for i in 0..n {
            store.insert(
                "b",
                ObjectDescriptor::new(format!("k{:04}", i), Utc::now(), 1, StorageTier::Standard),
            );
        }
        store
    }

    #[tokio::test]
    async fn test_flushes_when_full() {
        let store = store_with(5);
        let mut deleter = BatchDeleter::new(&store, "b", 2);

        assert!(deleter.offer("k0000".into()).await.unwrap().is_none());
        let report = deleter.offer("k0001".into()).await.unwrap().unwrap();
        assert_eq!(report.requested, 2);
        assert_eq!(report.deleted.len(), 2);
        assert_eq!(deleter.pending(), 0);

        deleter.offer("k0002".into()).await.unwrap();
        let last = deleter.finish().await.unwrap().unwrap();
        assert_eq!(last.deleted, vec!["k0002".to_string()]);
        assert_eq!(store.delete_batch_sizes(), vec![2, 1]);
        assert_eq!(store.len("b"), 2);
    }

    #[tokio::test]
    async fn test_empty_finish_sends_nothing() {
        let store = store_with(1);
        let mut deleter = BatchDeleter::new(&store, "b", 10);
        assert!(deleter.finish().await.unwrap().is_none());
        assert_eq!(deleter.batches_sent(), 0);
        assert!(store.requests().is_empty());
    }

    #[tokio::test]
    async fn test_rejections_reported() {
        let store = store_with(3);
        store.reject_delete("k0001");
        let mut deleter = BatchDeleter::new(&store, "b", 10);
        for i in 0..3 {
            deleter.offer(format!("k{:04}", i)).await.unwrap();
        }
        let report = deleter.finish().await.unwrap().unwrap();
        assert_eq!(report.deleted.len(), 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].key, "k0001");
        assert!(store.get("b", "k0001").is_some());
    }

    #[tokio::test]
    async fn test_transport_failure_is_error() {
        let store = store_with(2);
        store.fail_delete_requests();
        let mut deleter = BatchDeleter::new(&store, "b", 2);
        deleter.offer("k0000".into()).await.unwrap();
        let err = deleter.offer("k0001".into()).await.unwrap_err();
        assert!(matches!(err, RunError::BatchDelete { keys: 2, .. }));
        assert_eq!(deleter.pending(), 0);
        assert_eq!(store.len("b"), 2);
    }

    #[test]
    fn test_reconcile_drops_unrequested() {
        let requested = vec!["a".to_string(), "b".to_string()];
        let outcome = DeleteOutcome {
            deleted: vec!["a".into(), "zzz".into()],
            rejected: vec![],
        };
        let report = reconcile(&requested, outcome);
        assert_eq!(report.deleted, vec!["a".to_string()]);
        assert_eq!(report.requested, 2);
    }
}

//! Causes that stop a run before the bucket is fully scanned.

use rusty_lifecycle_storage::StorageError;
use thiserror::Error;

/// Fatal run errors. The summary gathered up to that point is still reported.
#[derive(Error, Debug, Clone)]
pub enum RunError {
    /// A listing page could not be fetched.
    #[error("Listing failed after {pages_fetched} pages: {source}")]
    Enumeration {
        pages_fetched: u64,
        #[source]
        source: StorageError,
    },

    /// A bulk delete request failed as a whole.
    #[error("Bulk delete of {keys} keys failed: {source}")]
    BatchDelete {
        keys: usize,
        #[source]
        source: StorageError,
    },
}

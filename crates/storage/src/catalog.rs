//! Paginated enumeration of a bucket.
//!
//! `ObjectCatalog` walks a listing one page at a time, so memory stays bounded
//! by the page size no matter how many objects the bucket holds. Objects are
//! yielded in the order the store returns them; nothing is sorted.
//!
//! # Example
//!
//! ```ignore
//! use rusty_lifecycle_storage::ObjectCatalog;
//!
//! let mut catalog = ObjectCatalog::new(&client, "my-bucket", Some("logs/"));
//! while let Some(page) = catalog.next_page().await? {
//!     for object in page {
//!         println!("{} {}", object.key, object.size);
//!     }
//! }
//! ```

use futures::stream::{self, Stream};

use crate::error::StorageError;
use crate::traits::ObjectStore;
use crate::types::ObjectDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
enum CursorState {
    Start,
    Continue(String),
    Exhausted,
}

/// Lazy, single-pass reader over a bucket listing.
pub struct ObjectCatalog<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    bucket: String,
    prefix: Option<String>,
    cursor: CursorState,
    pages_fetched: u64,
}

impl<'a, S: ObjectStore + ?Sized> ObjectCatalog<'a, S> {
    /// Create a catalog reader. No request is made until the first page is asked for.
    ///
    /// # Arguments
    /// * `store` - Object store to list
    /// * `bucket` - Bucket name
    /// * `prefix` - Optional key prefix
    pub fn new(store: &'a S, bucket: impl Into<String>, prefix: Option<&str>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            prefix: prefix.map(str::to_string),
            cursor: CursorState::Start,
            pages_fetched: 0,
        }
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// Whether the listing has been fully consumed (or aborted by an error).
    pub fn is_exhausted(&self) -> bool {
        self.cursor == CursorState::Exhausted
    }

    /// Fetch the next page.
    ///
    /// # Returns
    /// `Ok(Some(objects))` for each page (a page may be empty), `Ok(None)` once
    /// the listing is finished.
    ///
    /// # Errors
    /// A failed fetch is returned as-is and leaves the catalog exhausted;
    /// the listing is not retried.
    pub async fn next_page(&mut self) -> Result<Option<Vec<ObjectDescriptor>>, StorageError> {
        let token: Option<String> = match &self.cursor {
            CursorState::Exhausted => return Ok(None),
            CursorState::Start => None,
            CursorState::Continue(token) => Some(token.clone()),
        };

        let page = match self
            .store
            .list_objects_page(&self.bucket, self.prefix.as_deref(), token.as_deref())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                self.cursor = CursorState::Exhausted;
                return Err(e);
            }
        };

        self.pages_fetched += 1;
        self.cursor = match page.next_continuation_token {
            Some(next) if token.as_deref() != Some(next.as_str()) => CursorState::Continue(next),
            Some(next) => {
                log::warn!(
                    "Listing of {} returned a repeated continuation token {}; stopping",
                    self.bucket,
                    next
                );
                CursorState::Exhausted
            }
            None => CursorState::Exhausted,
        };

        Ok(Some(page.objects))
    }

    /// Turn the catalog into a stream of pages.
    ///
    /// The stream ends after the last page or after the first error.
    pub fn into_stream(
        self,
    ) -> impl Stream<Item = Result<Vec<ObjectDescriptor>, StorageError>> + 'a
    where
        S: 'a,
    {
        stream::try_unfold(self, |mut catalog| async move {
            Ok(catalog.next_page().await?.map(|page| (page, catalog)))
        })
    }
}

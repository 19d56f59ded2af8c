//! Object store abstraction for rusty-lifecycle.
//!
//! This crate provides a backend-agnostic interface for the object store
//! operations a lifecycle run needs: paged listings, bulk deletes, in-place
//! copies into another storage class (single request or multipart), and
//! object tagging. Backends:
//!
//! - **CRT Backend** (`rusty-lifecycle-storage-crt`) - AWS SDK for Rust
//! - **Memory Backend** (`MemoryObjectStore`) - in-process, with request recording and failure injection for tests
//!
//! # Catalog
//!
//! `ObjectCatalog` walks a bucket one listing page at a time and is the only
//! way the engine enumerates objects.

mod catalog;
mod error;
pub mod memory;
mod parts;
mod traits;
mod types;

pub use catalog::ObjectCatalog;
pub use error::{ItemFailure, StorageError};
pub use memory::{MemoryObjectStore, StoreRequest};
pub use parts::{copy_strategy, effective_part_size, plan_copy_parts, CopyPart, CopyStrategy};
pub use traits::ObjectStore;
pub use types::{
    AwsCredentials, DeleteOutcome, ObjectDescriptor, ObjectPage, RejectedKey, StorageSettings,
    StorageTier, Tag, TagSet, ARCHIVED_TIERS,
};

//! AWS SDK S3 backend for rusty-lifecycle storage.
//!
//! This crate provides an `ObjectStore` implementation using the AWS SDK for Rust.
//! It supports all S3 operations required by lifecycle runs: paged listings,
//! bulk deletes, in-place storage class changes (including multipart copies
//! for objects over 5 GiB) and object tagging.
//!
//! # Example
//!
//! ```ignore
//! use rusty_lifecycle_storage_crt::CrtStorageClient;
//! use rusty_lifecycle_storage::{ObjectCatalog, StorageSettings};
//!
//! let settings = StorageSettings::default();
//! let client = CrtStorageClient::new(settings).await?;
//!
//! let mut catalog = ObjectCatalog::new(&client, "my-bucket", None);
//! ```

mod client;
mod error;

pub use client::CrtStorageClient;
pub use error::CrtError;

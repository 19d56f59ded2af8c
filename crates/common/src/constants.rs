//! Shared constants used across rusty-lifecycle crates.

/// One gibibyte.
pub const GIB: u64 = 1024 * 1024 * 1024;

/// One mebibyte.
pub const MIB: u64 = 1024 * 1024;

/// Maximum number of keys accepted by a single bulk delete request.
/// This is a hard protocol limit of S3 `DeleteObjects`, not a tuning knob.
pub const MAX_DELETE_BATCH_SIZE: usize = 1000;

/// Objects larger than this (5 GiB) cannot be copied with a single
/// `CopyObject` request and must use multipart copy.
pub const DEFAULT_MULTIPART_THRESHOLD: u64 = 5 * GIB;

/// Part size used for multipart copies (1 GiB).
pub const DEFAULT_COPY_CHUNK_SIZE: u64 = GIB;

/// Smallest part S3 accepts for every part but the last (5 MiB).
pub const MIN_COPY_PART_SIZE: u64 = 5 * MIB;

/// Largest part S3 accepts (5 GiB).
pub const MAX_COPY_PART_SIZE: u64 = 5 * GIB;

/// Maximum number of parts in one multipart upload.
pub const MAX_COPY_PARTS: u64 = 10_000;

/// Default age threshold for cleanup runs, in days.
pub const DEFAULT_CLEANUP_AGE_DAYS: u32 = 30;

/// Default age threshold for archive runs, in days.
pub const DEFAULT_ARCHIVE_AGE_DAYS: u32 = 180;

/// Number of deleted keys kept in a run summary for reporting.
pub const DEFAULT_DELETED_SAMPLE_SIZE: usize = 100;

/// Default number of migrations in flight at once.
pub const DEFAULT_MIGRATION_CONCURRENCY: usize = 1;

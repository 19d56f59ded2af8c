//! Run policy: the validated, immutable settings of one lifecycle run.

use std::fmt;
use std::str::FromStr;

use rusty_lifecycle_common::{
    normalize_prefix, ConfigError, DEFAULT_ARCHIVE_AGE_DAYS, DEFAULT_CLEANUP_AGE_DAYS,
    DEFAULT_COPY_CHUNK_SIZE, DEFAULT_DELETED_SAMPLE_SIZE, DEFAULT_MIGRATION_CONCURRENCY,
    DEFAULT_MULTIPART_THRESHOLD, MAX_COPY_PART_SIZE, MAX_DELETE_BATCH_SIZE,
};
use rusty_lifecycle_storage::StorageTier;
use serde::{Deserialize, Serialize};

/// What a run does with eligible objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Delete eligible objects.
    Cleanup,
    /// Move eligible, not yet archived objects into `target_tier`.
    Archive { target_tier: StorageTier },
}

impl RunMode {
    /// The mode name without its parameters.
    pub fn kind(&self) -> RunModeKind {
        match self {
            RunMode::Cleanup => RunModeKind::Cleanup,
            RunMode::Archive { .. } => RunModeKind::Archive,
        }
    }
}

/// Mode name as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunModeKind {
    #[default]
    Cleanup,
    Archive,
}

impl RunModeKind {
    /// Age threshold used when none is configured.
    pub fn default_age_days(&self) -> u32 {
        match self {
            RunModeKind::Cleanup => DEFAULT_CLEANUP_AGE_DAYS,
            RunModeKind::Archive => DEFAULT_ARCHIVE_AGE_DAYS,
        }
    }
}

impl FromStr for RunModeKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cleanup" | "delete" => Ok(RunModeKind::Cleanup),
            "archive" => Ok(RunModeKind::Archive),
            other => Err(ConfigError::invalid(
                "mode",
                format!("expected 'cleanup' or 'archive', got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for RunModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunModeKind::Cleanup => f.write_str("cleanup"),
            RunModeKind::Archive => f.write_str("archive"),
        }
    }
}

/// Settings of one run.
///
/// Build one with [`RunPolicy::cleanup`] or [`RunPolicy::archive`], adjust it
/// with the `with_*` setters, and let the coordinator call [`RunPolicy::validate`].
///
/// # Example
///
/// ```ignore
/// let policy = RunPolicy::archive("media", StorageTier::DeepArchive)
///     .with_age_threshold_days(365)
///     .with_prefix(Some("raw/"));
/// ```
#[derive(Debug, Clone)]
pub struct RunPolicy {
    /// Bucket to scan.
    pub bucket: String,
    /// Action applied to eligible objects.
    pub mode: RunMode,
    /// Objects must be strictly older than this many days to be eligible.
    pub age_threshold_days: u32,
    /// Optional key prefix restricting the scan.
    pub prefix: Option<String>,
    /// Keys per bulk delete request.
    pub delete_batch_size: usize,
    /// Largest object copied with a single request.
    pub multipart_threshold: u64,
    /// Part size for multipart copies.
    pub chunk_size: u64,
    /// How many deleted keys the summary keeps.
    pub deleted_sample_size: usize,
    /// Migrations in flight at once.
    pub migration_concurrency: usize,
}

impl RunPolicy {
    fn with_mode(bucket: impl Into<String>, mode: RunMode) -> Self {
        Self {
            bucket: bucket.into(),
            age_threshold_days: mode.kind().default_age_days(),
            mode,
            prefix: None,
            delete_batch_size: MAX_DELETE_BATCH_SIZE,
            multipart_threshold: DEFAULT_MULTIPART_THRESHOLD,
            chunk_size: DEFAULT_COPY_CHUNK_SIZE,
            deleted_sample_size: DEFAULT_DELETED_SAMPLE_SIZE,
            migration_concurrency: DEFAULT_MIGRATION_CONCURRENCY,
        }
    }

    /// Policy deleting objects older than 30 days.
    pub fn cleanup(bucket: impl Into<String>) -> Self {
        Self::with_mode(bucket, RunMode::Cleanup)
    }

    /// Policy archiving objects older than 180 days into `target_tier`.
    pub fn archive(bucket: impl Into<String>, target_tier: StorageTier) -> Self {
        Self::with_mode(bucket, RunMode::Archive { target_tier })
    }

    /// Set the age threshold in days.
    pub fn with_age_threshold_days(mut self, days: u32) -> Self {
        self.age_threshold_days = days;
        self
    }

    /// Restrict the scan to a key prefix, used verbatim. An empty prefix scans
    /// the whole bucket.
    pub fn with_prefix(mut self, prefix: Option<&str>) -> Self {
        self.prefix = normalize_prefix(prefix);
        self
    }

    /// Set the number of keys per bulk delete request.
    pub fn with_delete_batch_size(mut self, size: usize) -> Self {
        self.delete_batch_size = size;
        self
    }

    /// Set the size above which copies use multipart.
    pub fn with_multipart_threshold(mut self, bytes: u64) -> Self {
        self.multipart_threshold = bytes;
        self
    }

    /// Set the multipart copy part size.
    pub fn with_chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Set how many deleted keys are kept in the summary.
    pub fn with_deleted_sample_size(mut self, size: usize) -> Self {
        self.deleted_sample_size = size;
        self
    }

    /// Set how many migrations may run at once.
    pub fn with_migration_concurrency(mut self, concurrency: usize) -> Self {
        self.migration_concurrency = concurrency;
        self
    }

    /// Target tier for archive runs.
    pub fn target_tier(&self) -> Option<&StorageTier> {
        match &self.mode {
            RunMode::Archive { target_tier } => Some(target_tier),
            RunMode::Cleanup => None,
        }
    }

    /// Check the policy before any request is made.
    ///
    /// # Errors
    /// Returns the first setting that is missing or out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::Missing { name: "bucket" });
        }
        if self.delete_batch_size == 0 || self.delete_batch_size > MAX_DELETE_BATCH_SIZE {
            return Err(ConfigError::invalid(
                "delete_batch_size",
                format!(
                    "must be between 1 and {}, got {}",
                    MAX_DELETE_BATCH_SIZE, self.delete_batch_size
                ),
            ));
        }
        if self.multipart_threshold == 0 || self.multipart_threshold > MAX_COPY_PART_SIZE {
            return Err(ConfigError::invalid(
                "multipart_threshold",
                format!(
                    "must be between 1 and {} bytes, got {}",
                    MAX_COPY_PART_SIZE, self.multipart_threshold
                ),
            ));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::invalid("chunk_size", "must be positive"));
        }
        if self.migration_concurrency == 0 {
            return Err(ConfigError::invalid(
                "migration_concurrency",
                "must be at least 1",
            ));
        }
        if let RunMode::Archive { target_tier } = &self.mode {
            if let StorageTier::Other(name) = target_tier {
                return Err(ConfigError::invalid(
                    "target_tier",
                    format!("unknown storage class '{}'", name),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_defaults() {
        let policy = RunPolicy::cleanup("bkt");
        assert_eq!(policy.age_threshold_days, 30);
        assert_eq!(policy.delete_batch_size, 1000);
        assert_eq!(policy.deleted_sample_size, 100);
        assert!(policy.target_tier().is_none());
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_archive_defaults() {
        let policy = RunPolicy::archive("bkt", StorageTier::Glacier);
        assert_eq!(policy.age_threshold_days, 180);
        assert_eq!(policy.multipart_threshold, 5 * 1024 * 1024 * 1024);
        assert_eq!(policy.chunk_size, 1024 * 1024 * 1024);
        assert_eq!(policy.target_tier(), Some(&StorageTier::Glacier));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_blank_bucket_rejected() {
        let err = RunPolicy::cleanup("  ").validate().unwrap_err();
        assert_eq!(err, ConfigError::Missing { name: "bucket" });
    }

    #[test]
    fn test_batch_size_bounds() {
        assert!(RunPolicy::cleanup("b").with_delete_batch_size(0).validate().is_err());
        assert!(RunPolicy::cleanup("b").with_delete_batch_size(1001).validate().is_err());
        assert!(RunPolicy::cleanup("b").with_delete_batch_size(1).validate().is_ok());
    }

    #[test]
    fn test_unknown_target_tier_rejected() {
        let policy = RunPolicy::archive("b", StorageTier::Other("COLD".into()));
        assert_eq!(policy.validate().unwrap_err().setting(), "target_tier");
    }

    #[test]
    fn test_prefix_kept_verbatim() {
        let policy = RunPolicy::cleanup("b").with_prefix(Some("/tmp/"));
        assert_eq!(policy.prefix.as_deref(), Some("/tmp/"));
        let policy = RunPolicy::cleanup("b").with_prefix(Some("logs "));
        assert_eq!(policy.prefix.as_deref(), Some("logs "));
        let policy = RunPolicy::cleanup("b").with_prefix(Some(""));
        assert!(policy.prefix.is_none());
    }

    #[test]
    fn test_mode_kind_parse() {
        assert_eq!("Archive".parse::<RunModeKind>().unwrap(), RunModeKind::Archive);
        assert_eq!("cleanup".parse::<RunModeKind>().unwrap(), RunModeKind::Cleanup);
        assert!("purge".parse::<RunModeKind>().is_err());
    }
}

//! Raw run configuration as read from flags, the environment or a file.

use rusty_lifecycle_common::ConfigError;
use rusty_lifecycle_storage::StorageTier;
use serde::{Deserialize, Serialize};

use crate::policy::{RunModeKind, RunPolicy};

/// Unvalidated lifecycle settings.
///
/// Every field except `bucket` is optional and falls back to the mode's
/// default. Call [`LifecycleConfig::into_policy`] to obtain a [`RunPolicy`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct LifecycleConfig {
    pub bucket: Option<String>,
    pub mode: RunModeKind,
    pub age_threshold_days: Option<u32>,
    pub prefix: Option<String>,
    pub target_tier: Option<StorageTier>,
    pub delete_batch_size: Option<usize>,
    pub multipart_threshold: Option<u64>,
    pub chunk_size: Option<u64>,
    pub deleted_sample_size: Option<usize>,
    pub migration_concurrency: Option<usize>,
}

impl LifecycleConfig {
    /// Create a configuration for `bucket` in the given mode.
    pub fn new(bucket: impl Into<String>, mode: RunModeKind) -> Self {
        Self {
            bucket: Some(bucket.into()),
            mode,
            ..Default::default()
        }
    }

    pub fn with_age_threshold_days(mut self, days: u32) -> Self {
        self.age_threshold_days = Some(days);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_target_tier(mut self, tier: StorageTier) -> Self {
        self.target_tier = Some(tier);
        self
    }

    pub fn with_delete_batch_size(mut self, size: usize) -> Self {
        self.delete_batch_size = Some(size);
        self
    }

    pub fn with_multipart_threshold(mut self, bytes: u64) -> Self {
        self.multipart_threshold = Some(bytes);
        self
    }

    pub fn with_chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size = Some(bytes);
        self
    }

    pub fn with_migration_concurrency(mut self, concurrency: usize) -> Self {
        self.migration_concurrency = Some(concurrency);
        self
    }

    /// Apply defaults and validate.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] naming the first missing or invalid setting.
    /// A target tier given for a cleanup run is rejected rather than ignored.
    pub fn into_policy(self) -> Result<RunPolicy, ConfigError> {
        let bucket: String = self
            .bucket
            .filter(|b| !b.trim().is_empty())
            .ok_or(ConfigError::Missing { name: "bucket" })?;

        let mut policy: RunPolicy = match self.mode {
            RunModeKind::Cleanup => {
                if let Some(tier) = self.target_tier {
                    return Err(ConfigError::invalid(
                        "target_tier",
                        format!("'{}' has no meaning for a cleanup run", tier),
                    ));
                }
                RunPolicy::cleanup(bucket)
            }
            RunModeKind::Archive => {
                RunPolicy::archive(bucket, self.target_tier.unwrap_or(StorageTier::Glacier))
            }
        };

        policy = policy.with_prefix(self.prefix.as_deref());
        if let Some(days) = self.age_threshold_days {
            policy = policy.with_age_threshold_days(days);
        }
        if let Some(size) = self.delete_batch_size {
            policy = policy.with_delete_batch_size(size);
        }
        if let Some(bytes) = self.multipart_threshold {
            policy = policy.with_multipart_threshold(bytes);
        }
        if let Some(bytes) = self.chunk_size {
            policy = policy.with_chunk_size(bytes);
        }
        if let Some(size) = self.deleted_sample_size {
            policy = policy.with_deleted_sample_size(size);
        }
        if let Some(concurrency) = self.migration_concurrency {
            policy = policy.with_migration_concurrency(concurrency);
        }

        policy.validate()?;
        Ok(policy)
    }
}

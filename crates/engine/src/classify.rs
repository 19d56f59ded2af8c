//! Per-object lifecycle decisions.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rusty_lifecycle_storage::{ObjectDescriptor, StorageTier};

use crate::policy::{RunMode, RunPolicy};

/// Why an object was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Not strictly older than the age threshold.
    TooRecent,
    /// Already in an archival tier.
    AlreadyArchived,
    /// Already in the requested target tier.
    AlreadyInTargetTier,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooRecent => f.write_str("too recent"),
            SkipReason::AlreadyArchived => f.write_str("already archived"),
            SkipReason::AlreadyInTargetTier => f.write_str("already in target tier"),
        }
    }
}

/// What to do with one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Skip(SkipReason),
    Delete,
    Migrate { target_tier: StorageTier },
}

/// Decide the action for `obj` under `policy` at instant `now`.
///
/// Only objects strictly older than the threshold are eligible; an object
/// exactly at the threshold, or dated in the future, is too recent.
pub fn classify(obj: &ObjectDescriptor, policy: &RunPolicy, now: DateTime<Utc>) -> Action {
    let threshold: Duration = Duration::days(i64::from(policy.age_threshold_days));
    if now.signed_duration_since(obj.last_modified) <= threshold {
        return Action::Skip(SkipReason::TooRecent);
    }

    match &policy.mode {
        RunMode::Cleanup => Action::Delete,
        RunMode::Archive { target_tier } => {
            if obj.tier.is_archived() {
                Action::Skip(SkipReason::AlreadyArchived)
            } else if obj.tier == *target_tier {
                Action::Skip(SkipReason::AlreadyInTargetTier)
            } else {
                Action::Migrate {
                    target_tier: target_tier.clone(),
                }
            }
        }
    }
}

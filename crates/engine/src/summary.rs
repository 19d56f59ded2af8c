//! Run accounting and the structured result returned to callers.

use rusty_lifecycle_common::ConfigError;
use rusty_lifecycle_storage::ItemFailure;
use serde::{Deserialize, Serialize};

use crate::delete::BatchReport;
use crate::error::RunError;
use crate::migrate::{MigrationReport, TagReplication};
use crate::policy::RunModeKind;

/// Counters for one run. Only store-confirmed operations are counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub scanned_count: u64,
    pub skipped_count: u64,
    pub deleted_count: u64,
    /// First deleted keys, bounded by `sample_limit`.
    pub deleted_sample: Vec<String>,
    pub rejected_count: u64,
    pub archived_count: u64,
    pub archived_bytes: u64,
    /// Failed migrations.
    pub error_count: u64,
    pub tag_copy_failures: u64,
    sample_limit: usize,
}

impl RunSummary {
    /// Create an empty summary keeping at most `sample_limit` deleted keys.
    pub fn new(sample_limit: usize) -> Self {
        Self {
            sample_limit,
            ..Default::default()
        }
    }

    /// Add the outcome of one bulk delete.
    pub fn record_batch(&mut self, report: BatchReport) {
        self.deleted_count += report.deleted.len() as u64;
        self.rejected_count += report.rejected.len() as u64;

        let room: usize = self.sample_limit.saturating_sub(self.deleted_sample.len());
        self.deleted_sample
            .extend(report.deleted.into_iter().take(room));
    }

    /// Add the outcome of one migration.
    pub fn record_migration(&mut self, result: Result<MigrationReport, ItemFailure>) {
        match result {
            Ok(report) => {
                self.archived_count += 1;
                self.archived_bytes += report.size;
                if matches!(report.tags, TagReplication::Failed(_)) {
                    self.tag_copy_failures += 1;
                }
            }
            Err(_) => self.error_count += 1,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Every page was scanned.
    Completed,
    /// The progress callback asked to stop.
    Cancelled,
    /// A fatal error stopped the run.
    Aborted(RunError),
}

/// Summary of a run together with how it ended.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub mode: RunModeKind,
    pub summary: RunSummary,
    pub outcome: RunOutcome,
    pub pages_scanned: u64,
}

impl RunReport {
    /// Whether the run stopped because of a fatal error.
    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, RunOutcome::Aborted(_))
    }

    /// The structured result for this run.
    pub fn to_result(&self) -> RunResult {
        RunResult::from(self)
    }
}

/// Result status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// Structured result of an invocation, serialized as JSON.
///
/// Cleanup runs report `deleted_count`/`deleted_sample`, archive runs report
/// `archived_count`/`error_count`. A configuration error carries only a
/// status and a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanned_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_sample: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_copy_failures: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RunResult {
    fn bare(status: RunStatus) -> Self {
        Self {
            status,
            scanned_count: None,
            skipped_count: None,
            deleted_count: None,
            deleted_sample: None,
            rejected_count: None,
            archived_count: None,
            archived_bytes: None,
            error_count: None,
            tag_copy_failures: None,
            message: None,
        }
    }

    /// Error result for a failure that happened before any scanning.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::bare(RunStatus::Error)
        }
    }

    /// Serialize as a single JSON line.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<&ConfigError> for RunResult {
    fn from(err: &ConfigError) -> Self {
        RunResult::error(err.to_string())
    }
}

impl From<&RunReport> for RunResult {
    fn from(report: &RunReport) -> Self {
        let summary: &RunSummary = &report.summary;
        let (status, message) = match &report.outcome {
            RunOutcome::Completed => (RunStatus::Success, None),
            RunOutcome::Cancelled => (
                RunStatus::Success,
                Some(format!("cancelled after {} pages", report.pages_scanned)),
            ),
            RunOutcome::Aborted(e) => (RunStatus::Error, Some(e.to_string())),
        };

        let mut result = RunResult::bare(status);
        result.message = message;
        result.scanned_count = Some(summary.scanned_count);
        result.skipped_count = Some(summary.skipped_count);

        match report.mode {
            RunModeKind::Cleanup => {
                result.deleted_count = Some(summary.deleted_count);
                result.deleted_sample = Some(summary.deleted_sample.clone());
                result.rejected_count = Some(summary.rejected_count);
            }
            RunModeKind::Archive => {
                result.archived_count = Some(summary.archived_count);
                result.archived_bytes = Some(summary.archived_bytes);
                result.error_count = Some(summary.error_count);
                result.tag_copy_failures = Some(summary.tag_copy_failures);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusty_lifecycle_storage::{CopyStrategy, RejectedKey, StorageError};

    fn batch(deleted: &[&str], rejected: &[&str]) -> BatchReport {
        BatchReport {
            requested: deleted.len() + rejected.len(),
            deleted: deleted.iter().map(|k| k.to_string()).collect(),
            rejected: rejected
                .iter()
                .map(|k| RejectedKey {
                    key: k.to_string(),
                    code: "AccessDenied".into(),
                    message: "denied".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_sample_is_bounded() {
        let mut summary = RunSummary::new(3);
        summary.record_batch(batch(&["a", "b"], &["x"]));
        summary.record_batch(batch(&["c", "d", "e"], &[]));
        assert_eq!(summary.deleted_count, 5);
        assert_eq!(summary.rejected_count, 1);
        assert_eq!(summary.deleted_sample, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_record_migration() {
        let mut summary = RunSummary::new(0);
        summary.record_migration(Ok(MigrationReport {
            key: "a".into(),
            size: 100,
            strategy: CopyStrategy::SingleRequest,
            tags: TagReplication::Failed(StorageError::network("x")),
        }));
        summary.record_migration(Err(ItemFailure::new("b", StorageError::network("y"))));
        assert_eq!(summary.archived_count, 1);
        assert_eq!(summary.archived_bytes, 100);
        assert_eq!(summary.tag_copy_failures, 1);
        assert_eq!(summary.error_count, 1);
    }

    #[test]
    fn test_cleanup_result_json() {
        let mut summary = RunSummary::new(10);
        summary.record_batch(batch(&["old.log"], &[]));
        let report = RunReport {
            mode: RunModeKind::Cleanup,
            summary,
            outcome: RunOutcome::Completed,
            pages_scanned: 1,
        };
        let value: serde_json::Value =
            serde_json::from_str(&report.to_result().to_json().unwrap()).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["deleted_count"], 1);
        assert_eq!(value["deleted_sample"][0], "old.log");
        assert!(value.get("archived_count").is_none());
        assert!(value.get("message").is_none());
    }

    #[test]
    fn test_aborted_result_keeps_counts() {
        let report = RunReport {
            mode: RunModeKind::Archive,
            summary: RunSummary::new(0),
            outcome: RunOutcome::Aborted(RunError::Enumeration {
                pages_fetched: 2,
                source: StorageError::network("reset"),
            }),
            pages_scanned: 2,
        };
        let result = report.to_result();
        assert_eq!(result.status, RunStatus::Error);
        assert_eq!(result.archived_count, Some(0));
        assert!(result.message.unwrap().contains("reset"));
    }

    #[test]
    fn test_config_error_result_has_no_counts() {
        let result = RunResult::from(&ConfigError::Missing { name: "bucket" });
        let json = result.to_json().unwrap();
        assert!(json.contains("\"status\":\"error\""));
        assert!(!json.contains("count"));
    }
}

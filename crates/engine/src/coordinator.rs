//! Drives one lifecycle run: list, classify, act, account.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use rusty_lifecycle_common::{ConfigError, ProgressCallback};
use rusty_lifecycle_storage::{ObjectCatalog, ObjectDescriptor, ObjectStore, StorageTier};

use crate::classify::{classify, Action};
use crate::delete::BatchDeleter;
use crate::error::RunError;
use crate::migrate::TierMigrator;
use crate::policy::RunPolicy;
use crate::summary::{RunOutcome, RunReport, RunSummary};

/// Progress snapshot passed to the callback after every listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanProgress {
    pub pages_scanned: u64,
    pub objects_scanned: u64,
    pub deleted: u64,
    pub archived: u64,
    pub errors: u64,
}

impl ScanProgress {
    fn from_summary(pages_scanned: u64, summary: &RunSummary) -> Self {
        Self {
            pages_scanned,
            objects_scanned: summary.scanned_count,
            deleted: summary.deleted_count,
            archived: summary.archived_count,
            errors: summary.error_count,
        }
    }
}

/// Runs a [`RunPolicy`] against an injected object store.
///
/// Pages are processed one at a time. Deletions are batched across pages;
/// migrations of one page may run concurrently (up to the policy's
/// `migration_concurrency`) and all finish before the next page is listed.
/// The coordinator is the only writer of the [`RunSummary`].
///
/// # Example
///
/// ```ignore
/// let policy = RunPolicy::cleanup("logs").with_prefix(Some("tmp/"));
/// let report = RunCoordinator::new(&client, policy)?.run().await;
/// println!("{}", report.to_result().to_json()?);
/// ```
pub struct RunCoordinator<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    policy: RunPolicy,
    progress: Option<&'a dyn ProgressCallback<ScanProgress>>,
}

impl<'a, S: ObjectStore + ?Sized> RunCoordinator<'a, S> {
    /// Create a coordinator.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the policy is invalid. No request is made.
    pub fn new(store: &'a S, policy: RunPolicy) -> Result<Self, ConfigError> {
        policy.validate()?;
        Ok(Self {
            store,
            policy,
            progress: None,
        })
    }

    /// Report progress after every page. Returning `false` from the callback
    /// cancels the run once pending deletions are flushed.
    pub fn with_progress(mut self, progress: &'a dyn ProgressCallback<ScanProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// The validated policy.
    pub fn policy(&self) -> &RunPolicy {
        &self.policy
    }

    /// Run with the current time as the age reference.
    pub async fn run(&self) -> RunReport {
        self.run_at(Utc::now()).await
    }

    /// Run with `now` as the age reference.
    ///
    /// Never fails: fatal errors end the run early and are reported in
    /// [`RunReport::outcome`] next to the partial summary.
    pub async fn run_at(&self, now: DateTime<Utc>) -> RunReport {
        let policy: &RunPolicy = &self.policy;
        let mut summary = RunSummary::new(policy.deleted_sample_size);
        let mut catalog =
            ObjectCatalog::new(self.store, policy.bucket.as_str(), policy.prefix.as_deref());
        let mut deleter =
            BatchDeleter::new(self.store, policy.bucket.as_str(), policy.delete_batch_size);
        let migrator = TierMigrator::new(
            self.store,
            policy.bucket.as_str(),
            policy.multipart_threshold,
            policy.chunk_size,
        );
        let mut outcome = RunOutcome::Completed;
        let mut pages: u64 = 0;

        log::info!(
            "Starting {} run on {} (prefix: {}, older than {} days)",
            policy.mode.kind(),
            policy.bucket,
            policy.prefix.as_deref().unwrap_or("<none>"),
            policy.age_threshold_days
        );

        'scan: loop {
            let page: Vec<ObjectDescriptor> = match catalog.next_page().await {
                Ok(Some(page)) => page,
                Ok(None) => break,
                Err(source) => {
                    log::error!("Listing of {} failed: {}", policy.bucket, source);
                    outcome = RunOutcome::Aborted(RunError::Enumeration {
                        pages_fetched: pages,
                        source,
                    });
                    break;
                }
            };
            pages += 1;

            let mut migrations: Vec<(ObjectDescriptor, StorageTier)> = Vec::new();
            for obj in page {
                summary.scanned_count += 1;
                match classify(&obj, policy, now) {
                    Action::Skip(reason) => {
                        summary.skipped_count += 1;
                        log::debug!("Skipping {}: {}", obj.key, reason);
                    }
                    Action::Delete => match deleter.offer(obj.key).await {
                        Ok(Some(report)) => summary.record_batch(report),
                        Ok(None) => {}
                        Err(e) => {
                            log::error!("{}", e);
                            outcome = RunOutcome::Aborted(e);
                            break 'scan;
                        }
                    },
                    Action::Migrate { target_tier } => migrations.push((obj, target_tier)),
                }
            }

            if !migrations.is_empty() {
                let migrator = &migrator;
                let results: Vec<_> = stream::iter(migrations)
                    .map(move |(obj, tier)| async move { migrator.migrate(&obj, &tier).await })
                    .buffer_unordered(policy.migration_concurrency)
                    .collect()
                    .await;
                for result in results {
                    summary.record_migration(result);
                }
            }

            if let Some(progress) = self.progress {
                if !progress.on_progress(&ScanProgress::from_summary(pages, &summary)) {
                    log::info!("Run cancelled after {} pages", pages);
                    outcome = RunOutcome::Cancelled;
                    break;
                }
            }
        }

        // Keys already queued are still deleted, unless the bulk delete path itself failed.
        if !matches!(outcome, RunOutcome::Aborted(RunError::BatchDelete { .. })) {
            match deleter.finish().await {
                Ok(Some(report)) => summary.record_batch(report),
                Ok(None) => {}
                Err(e) => {
                    log::error!("{}", e);
                    if matches!(outcome, RunOutcome::Aborted(_)) {
                        log::warn!("Keeping the earlier failure as the run outcome");
                    } else {
                        outcome = RunOutcome::Aborted(e);
                    }
                }
            }
        }

        log::info!(
            "Finished {} run on {}: scanned {}, skipped {}, deleted {}, rejected {}, archived {}, errors {}",
            policy.mode.kind(),
            policy.bucket,
            summary.scanned_count,
            summary.skipped_count,
            summary.deleted_count,
            summary.rejected_count,
            summary.archived_count,
            summary.error_count
        );

        RunReport {
            mode: policy.mode.kind(),
            summary,
            outcome,
            pages_scanned: pages,
        }
    }
}

//! Lifecycle run engine for rusty-lifecycle.
//!
//! A run lists a bucket page by page, classifies every object against a
//! [`RunPolicy`] and either deletes eligible objects in bounded batches
//! (cleanup) or moves them into a colder storage class in place (archive).
//!
//! # Example
//!
//! ```ignore
//! use rusty_lifecycle_engine::{LifecycleConfig, RunCoordinator, RunModeKind};
//!
//! let policy = LifecycleConfig::new("my-bucket", RunModeKind::Archive)
//!     .with_age_threshold_days(365)
//!     .into_policy()?;
//! let report = RunCoordinator::new(&store, policy)?.run().await;
//! println!("{}", report.to_result().to_json()?);
//! ```

mod classify;
mod config;
mod coordinator;
mod delete;
mod error;
mod migrate;
mod policy;
mod summary;

pub use classify::{classify, Action, SkipReason};
pub use config::LifecycleConfig;
pub use coordinator::{RunCoordinator, ScanProgress};
pub use delete::{BatchDeleter, BatchReport};
pub use error::RunError;
pub use migrate::{MigrationReport, TagReplication, TierMigrator};
pub use policy::{RunMode, RunModeKind, RunPolicy};
pub use summary::{RunOutcome, RunReport, RunResult, RunStatus, RunSummary};

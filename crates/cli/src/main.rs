//! rusty-lifecycle: delete or archive aged objects in an S3 bucket.
//!
//! Settings come from flags, environment variables and an optional JSON
//! config file (flags and environment win). The run result is printed to
//! stdout as one JSON object; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rusty_lifecycle_engine::{LifecycleConfig, RunCoordinator, RunModeKind, RunResult};
use rusty_lifecycle_storage::{StorageSettings, StorageTier};
use rusty_lifecycle_storage_crt::CrtStorageClient;

#[derive(Parser, Debug)]
#[command(name = "rusty-lifecycle", author, version, about, long_about = None)]
struct Args {
    /// JSON file with lifecycle settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bucket to scan
    #[arg(short, long, env = "BUCKET_NAME")]
    bucket: Option<String>,

    /// Run mode: cleanup or archive
    #[arg(short, long, env = "LIFECYCLE_MODE")]
    mode: Option<RunModeKind>,

    /// Only act on objects older than this many days
    #[arg(short, long, env = "DAYS_THRESHOLD")]
    days: Option<u32>,

    /// Only scan keys under this prefix
    #[arg(short, long, env = "PREFIX")]
    prefix: Option<String>,

    /// Storage class to archive into (archive mode)
    #[arg(long, env = "TARGET_STORAGE_CLASS")]
    target_storage_class: Option<StorageTier>,

    /// Keys per bulk delete request (1-1000)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Migrations in flight at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    region: String,

    /// Expected owner account of the bucket
    #[arg(long, env = "EXPECTED_BUCKET_OWNER")]
    expected_bucket_owner: Option<String>,

    /// Custom S3 endpoint (S3-compatible stores)
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    endpoint_url: Option<String>,
}

impl Args {
    /// Merge the config file (if any) with flags and environment.
    fn lifecycle_config(&self) -> Result<LifecycleConfig> {
        let mut config: LifecycleConfig = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
            None => LifecycleConfig::default(),
        };

        if let Some(bucket) = &self.bucket {
            config.bucket = Some(bucket.clone());
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(days) = self.days {
            config.age_threshold_days = Some(days);
        }
        if let Some(prefix) = &self.prefix {
            config.prefix = Some(prefix.clone());
        }
        if let Some(tier) = &self.target_storage_class {
            config.target_tier = Some(tier.clone());
        }
        if let Some(size) = self.batch_size {
            config.delete_batch_size = Some(size);
        }
        if let Some(concurrency) = self.concurrency {
            config.migration_concurrency = Some(concurrency);
        }
        Ok(config)
    }

    fn storage_settings(&self) -> StorageSettings {
        StorageSettings {
            region: self.region.clone(),
            expected_bucket_owner: self.expected_bucket_owner.clone(),
            endpoint_url: self.endpoint_url.clone(),
            ..Default::default()
        }
    }
}

fn emit(result: &RunResult) -> Result<()> {
    println!("{}", result.to_json().context("Failed to serialize run result")?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let policy = match args.lifecycle_config()?.into_policy() {
        Ok(policy) => policy,
        Err(e) => {
            log::error!("{}", e);
            emit(&RunResult::from(&e))?;
            return Ok(ExitCode::from(2));
        }
    };

    let client = match CrtStorageClient::new(args.storage_settings()).await {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to create S3 client: {}", e);
            emit(&RunResult::error(e.to_string()))?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let report = RunCoordinator::new(&client, policy)?.run().await;
    emit(&report.to_result())?;

    if report.is_aborted() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["rusty-lifecycle"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_archive_flags() {
        let args = parse(&[
            "--bucket",
            "media",
            "--mode",
            "archive",
            "--days",
            "365",
            "--target-storage-class",
            "DEEP_ARCHIVE",
        ]);
        let policy = args.lifecycle_config().unwrap().into_policy().unwrap();
        assert_eq!(policy.bucket, "media");
        assert_eq!(policy.age_threshold_days, 365);
        assert_eq!(policy.target_tier(), Some(&StorageTier::DeepArchive));
    }

    #[test]
    fn test_invalid_mode_rejected() {
        let argv = ["rusty-lifecycle", "--bucket", "b", "--mode", "shred"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_storage_settings_from_flags() {
        let args = parse(&[
            "--region",
            "eu-west-1",
            "--expected-bucket-owner",
            "123456789012",
        ]);
        let settings = args.storage_settings();
        assert_eq!(settings.region, "eu-west-1");
        assert_eq!(settings.expected_bucket_owner.as_deref(), Some("123456789012"));
        assert!(settings.credentials.is_none());
    }
}

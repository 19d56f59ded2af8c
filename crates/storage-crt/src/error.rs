//! Error types for CRT storage operations.

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use rusty_lifecycle_storage::StorageError;
use thiserror::Error;

/// Errors specific to the CRT storage client.
#[derive(Error, Debug)]
pub enum CrtError {
    /// AWS SDK error.
    #[error("AWS SDK error on s3://{bucket}/{key}: {message}")]
    SdkError {
        bucket: String,
        key: String,
        code: Option<String>,
        message: String,
    },

    /// A request could not be built from the given input.
    #[error("Invalid request: {0}")]
    RequestBuild(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CrtError {
    /// Wrap an SDK error together with the object it concerned.
    ///
    /// # Arguments
    /// * `err` - Error returned by an SDK operation
    /// * `bucket` - Bucket of the request
    /// * `key` - Object key of the request (empty for bucket-level calls)
    pub fn from_sdk<E, R>(err: SdkError<E, R>, bucket: &str, key: &str) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        let code: Option<String> = err.code().map(str::to_string);
        let message: String = DisplayErrorContext(&err).to_string();
        CrtError::SdkError {
            bucket: bucket.to_string(),
            key: key.to_string(),
            code,
            message,
        }
    }
}

impl From<CrtError> for StorageError {
    fn from(err: CrtError) -> Self {
        match err {
            CrtError::SdkError {
                bucket,
                key,
                code,
                message,
            } => match code.as_deref() {
                Some("NoSuchKey") | Some("NotFound") => StorageError::NotFound { bucket, key },
                Some("NoSuchBucket") => StorageError::BucketNotFound { bucket },
                Some("AccessDenied") | Some("Forbidden") => StorageError::AccessDenied {
                    bucket,
                    key,
                    message,
                },
                _ => StorageError::NetworkError { message },
            },
            CrtError::RequestBuild(message) => StorageError::InvalidRequest { message },
            CrtError::ConfigError(message) => StorageError::InvalidConfig { message },
        }
    }
}

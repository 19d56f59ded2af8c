//! Error types for storage operations.

use thiserror::Error;

/// Errors that can occur during object store operations.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    /// Object not found.
    #[error("Object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Bucket does not exist.
    #[error("Bucket not found: {bucket}")]
    BucketNotFound { bucket: String },

    /// Access denied.
    #[error("Access denied to s3://{bucket}/{key}: {message}")]
    AccessDenied {
        bucket: String,
        key: String,
        message: String,
    },

    /// Network or service error.
    #[error("Network error: {message}")]
    NetworkError { message: String },

    /// A multipart copy could not be completed. The destination was left untouched.
    #[error("Multipart copy of {key} failed at part {part_number}: {message}")]
    MultipartCopyFailed {
        key: String,
        part_number: i32,
        message: String,
    },

    /// The request was rejected before reaching the store.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl StorageError {
    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        StorageError::NetworkError {
            message: message.into(),
        }
    }
}

/// Non-fatal error for a single object, recorded while a run continues.
#[derive(Debug, Clone)]
pub struct ItemFailure {
    /// The key that failed.
    pub key: String,
    /// The error that occurred.
    pub error: StorageError,
}

impl ItemFailure {
    /// Create a new item failure.
    pub fn new(key: impl Into<String>, error: StorageError) -> Self {
        Self {
            key: key.into(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_message_names_part() {
        let err = StorageError::MultipartCopyFailed {
            key: "big.bin".into(),
            part_number: 4,
            message: "timeout".into(),
        };
        assert_eq!(
            err.to_string(),
            "Multipart copy of big.bin failed at part 4: timeout"
        );
    }
}

//! Shared error types used across rusty-lifecycle crates.

use thiserror::Error;

/// Invalid or missing run configuration.
///
/// Configuration errors are detected before any object is listed, so a run
/// that fails with one of these has made no progress at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting was not provided.
    #[error("Missing required setting: {name}")]
    Missing {
        /// Name of the setting.
        name: &'static str,
    },

    /// A setting was provided but its value is not acceptable.
    #[error("Invalid value for {name}: {message}")]
    InvalidValue {
        /// Name of the setting.
        name: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

impl ConfigError {
    /// Create an InvalidValue error.
    ///
    /// # Arguments
    /// * `name` - Name of the offending setting
    /// * `message` - Why the value was rejected
    pub fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            name,
            message: message.into(),
        }
    }

    /// Name of the setting this error refers to.
    pub fn setting(&self) -> &'static str {
        match self {
            Self::Missing { name } | Self::InvalidValue { name, .. } => name,
        }
    }
}

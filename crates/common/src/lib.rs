//! Shared types and utilities for rusty-lifecycle.
//!
//! This crate provides common functionality used across all rusty-lifecycle crates:
//! - Provider limits and run defaults
//! - Configuration error type
//! - Generic progress callback trait
//! - Key prefix normalization

pub mod constants;
pub mod error;
pub mod prefix;
pub mod progress;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::ConfigError;
pub use prefix::{key_matches_prefix, normalize_prefix};
pub use progress::{progress_fn, FnProgress, ProgressCallback};

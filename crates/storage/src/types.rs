//! Shared data structures for storage operations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configuration settings for the S3 backend.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// AWS region.
    pub region: String,
    /// AWS credentials (access key, secret key, session token).
    /// When absent the default credential chain is used.
    pub credentials: Option<AwsCredentials>,
    /// Expected bucket owner account, sent with every request when set.
    pub expected_bucket_owner: Option<String>,
    /// Custom endpoint (S3-compatible stores, local testing).
    pub endpoint_url: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            region: "us-east-1".into(),
            credentials: None,
            expected_bucket_owner: None,
            endpoint_url: None,
        }
    }
}

/// AWS credentials.
#[derive(Debug, Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

/// Storage class of an object.
///
/// Unknown classes reported by the store are kept verbatim in `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StorageTier {
    #[default]
    Standard,
    ReducedRedundancy,
    StandardIa,
    OnezoneIa,
    IntelligentTiering,
    Glacier,
    DeepArchive,
    GlacierIr,
    Outposts,
    Other(String),
}

/// Tiers whose objects are already archived and are never migrated again.
pub const ARCHIVED_TIERS: [StorageTier; 3] = [
    StorageTier::Glacier,
    StorageTier::DeepArchive,
    StorageTier::GlacierIr,
];

impl StorageTier {
    /// The S3 wire name of this tier.
    pub fn as_str(&self) -> &str {
        match self {
            StorageTier::Standard => "STANDARD",
            StorageTier::ReducedRedundancy => "REDUCED_REDUNDANCY",
            StorageTier::StandardIa => "STANDARD_IA",
            StorageTier::OnezoneIa => "ONEZONE_IA",
            StorageTier::IntelligentTiering => "INTELLIGENT_TIERING",
            StorageTier::Glacier => "GLACIER",
            StorageTier::DeepArchive => "DEEP_ARCHIVE",
            StorageTier::GlacierIr => "GLACIER_IR",
            StorageTier::Outposts => "OUTPOSTS",
            StorageTier::Other(name) => name,
        }
    }

    /// Whether objects in this tier count as already archived.
    pub fn is_archived(&self) -> bool {
        ARCHIVED_TIERS.contains(self)
    }

    /// Parse a tier as reported by a listing. A missing class means STANDARD.
    pub fn from_listing(name: Option<&str>) -> Self {
        match name {
            Some(n) if !n.is_empty() => StorageTier::from(n.to_string()),
            _ => StorageTier::Standard,
        }
    }
}

impl From<String> for StorageTier {
    fn from(name: String) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "STANDARD" => StorageTier::Standard,
            "REDUCED_REDUNDANCY" => StorageTier::ReducedRedundancy,
            "STANDARD_IA" => StorageTier::StandardIa,
            "ONEZONE_IA" => StorageTier::OnezoneIa,
            "INTELLIGENT_TIERING" => StorageTier::IntelligentTiering,
            "GLACIER" => StorageTier::Glacier,
            "DEEP_ARCHIVE" => StorageTier::DeepArchive,
            "GLACIER_IR" => StorageTier::GlacierIr,
            "OUTPOSTS" => StorageTier::Outposts,
            _ => StorageTier::Other(name),
        }
    }
}

impl From<StorageTier> for String {
    fn from(tier: StorageTier) -> Self {
        tier.as_str().to_string()
    }
}

impl FromStr for StorageTier {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(StorageTier::from(s.trim().to_string()))
    }
}

impl fmt::Display for StorageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an object listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    /// Object key.
    pub key: String,
    /// Last modified timestamp.
    pub last_modified: DateTime<Utc>,
    /// Object size in bytes.
    pub size: u64,
    /// Current storage class.
    pub tier: StorageTier,
}

impl ObjectDescriptor {
    /// Create a descriptor.
    pub fn new(
        key: impl Into<String>,
        last_modified: DateTime<Utc>,
        size: u64,
        tier: StorageTier,
    ) -> Self {
        Self {
            key: key.into(),
            last_modified,
            size,
            tier,
        }
    }
}

/// A single object tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    /// Create a tag.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered tag set of an object.
pub type TagSet = Vec<Tag>;

/// One page of a listing.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// Objects on this page, in store order.
    pub objects: Vec<ObjectDescriptor>,
    /// Token for the next page, None when this is the last page.
    pub next_continuation_token: Option<String>,
}

/// A key the store refused to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedKey {
    /// The key that was not deleted.
    pub key: String,
    /// Store error code (e.g. "AccessDenied").
    pub code: String,
    /// Human readable reason.
    pub message: String,
}

/// Server response to a bulk delete: which keys were confirmed, which were rejected.
#[derive(Debug, Clone, Default)]
pub struct DeleteOutcome {
    /// Keys the store confirmed as deleted.
    pub deleted: Vec<String>,
    /// Keys the store rejected, with reasons.
    pub rejected: Vec<RejectedKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_round_trips_wire_names() {
        for name in [
            "STANDARD",
            "STANDARD_IA",
            "GLACIER",
            "DEEP_ARCHIVE",
            "GLACIER_IR",
            "INTELLIGENT_TIERING",
        ] {
            assert_eq!(StorageTier::from(name.to_string()).as_str(), name);
        }
    }

    #[test]
    fn test_tier_unknown_is_preserved() {
        let tier: StorageTier = "EXPRESS_ONEZONE".parse().unwrap();
        assert_eq!(tier, StorageTier::Other("EXPRESS_ONEZONE".to_string()));
        assert_eq!(tier.to_string(), "EXPRESS_ONEZONE");
    }

    #[test]
    fn test_tier_parse_is_case_insensitive() {
        let tier: StorageTier = "glacier".parse().unwrap();
        assert_eq!(tier, StorageTier::Glacier);
    }

    #[test]
    fn test_archived_membership() {
        assert!(StorageTier::Glacier.is_archived());
        assert!(StorageTier::DeepArchive.is_archived());
        assert!(StorageTier::GlacierIr.is_archived());
        assert!(!StorageTier::Standard.is_archived());
        assert!(!StorageTier::StandardIa.is_archived());
        assert!(!StorageTier::Other("GLACIER_X".into()).is_archived());
    }

    #[test]
    fn test_missing_listing_class_is_standard() {
        assert_eq!(StorageTier::from_listing(None), StorageTier::Standard);
        assert_eq!(StorageTier::from_listing(Some("")), StorageTier::Standard);
        assert_eq!(
            StorageTier::from_listing(Some("GLACIER")),
            StorageTier::Glacier
        );
    }
}

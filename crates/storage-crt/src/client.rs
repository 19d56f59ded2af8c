//! AWS SDK S3 client implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::types::{
    CompletedMultipartUpload, CompletedPart, Delete, MetadataDirective, ObjectIdentifier,
    StorageClass, Tagging,
};
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};

use rusty_lifecycle_storage::{
    CopyPart, DeleteOutcome, ObjectDescriptor, ObjectPage, ObjectStore, RejectedKey,
    StorageError, StorageSettings, StorageTier, Tag, TagSet,
};

use crate::error::CrtError;

/// ObjectStore implementation using AWS SDK for Rust.
///
/// This client provides the S3 operations a lifecycle run needs with the
/// SDK's built-in retry and connection pooling.
pub struct CrtStorageClient {
    /// The underlying S3 client.
    s3_client: S3Client,
    /// Expected bucket owner for security validation.
    expected_bucket_owner: Option<String>,
}

impl CrtStorageClient {
    /// Create a new CRT storage client with default credential chain.
    ///
    /// # Arguments
    /// * `settings` - Storage settings including region and optional credentials
    ///
    /// # Returns
    /// A new CRT storage client.
    pub async fn new(settings: StorageSettings) -> Result<Self, StorageError> {
        if settings.region.trim().is_empty() {
            return Err(CrtError::ConfigError("region must not be empty".into()).into());
        }

        let config_loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(settings.region.clone()));

        let config_loader = if let Some(ref creds) = settings.credentials {
            let credentials = Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                creds.session_token.clone(),
                None,
                "rusty-lifecycle",
            );
            config_loader.credentials_provider(credentials)
        } else {
            config_loader
        };

        let sdk_config = config_loader.load().await;
        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(ref endpoint) = settings.endpoint_url {
            s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
        }
        let s3_client = S3Client::from_conf(s3_config.build());

        Ok(Self {
            s3_client,
            expected_bucket_owner: settings.expected_bucket_owner,
        })
    }

    /// Create a client from an existing S3Client (for testing).
    ///
    /// # Arguments
    /// * `s3_client` - Pre-configured S3 client
    /// * `expected_bucket_owner` - Optional expected bucket owner
    pub fn from_client(s3_client: S3Client, expected_bucket_owner: Option<String>) -> Self {
        Self {
            s3_client,
            expected_bucket_owner,
        }
    }

    /// Source object metadata carried over to a multipart copy.
    ///
    /// `CreateMultipartUpload` has no metadata directive, so the headers of
    /// the source are read and replayed on the new upload.
    async fn head_for_copy(&self, bucket: &str, key: &str) -> Result<SourceHeaders, StorageError> {
        let output = self
            .s3_client
            .head_object()
            .bucket(bucket)
            .key(key)
            .set_expected_bucket_owner(self.expected_bucket_owner.clone())
            .send()
            .await
            .map_err(|err| CrtError::from_sdk(err, bucket, key))?;

        Ok(SourceHeaders {
            e_tag: output.e_tag().map(str::to_string),
            content_type: output.content_type().map(str::to_string),
            content_encoding: output.content_encoding().map(str::to_string),
            content_disposition: output.content_disposition().map(str::to_string),
            content_language: output.content_language().map(str::to_string),
            cache_control: output.cache_control().map(str::to_string),
            metadata: output.metadata().cloned(),
        })
    }

    /// Copy every part of an open multipart upload and complete it.
    async fn copy_parts_and_complete(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        source_etag: Option<&str>,
        parts: &[CopyPart],
    ) -> Result<(), StorageError> {
        let copy_source: String = copy_source(bucket, key);
        let mut completed: Vec<CompletedPart> = Vec::with_capacity(parts.len());

        for part in parts {
            let output = self
                .s3_client
                .upload_part_copy()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part.part_number)
                .copy_source(&copy_source)
                .copy_source_range(part.range_header())
                .set_copy_source_if_match(source_etag.map(str::to_string))
                .set_expected_bucket_owner(self.expected_bucket_owner.clone())
                .set_expected_source_bucket_owner(self.expected_bucket_owner.clone())
                .send()
                .await
                .map_err(|err| StorageError::MultipartCopyFailed {
                    key: key.to_string(),
                    part_number: part.part_number,
                    message: StorageError::from(CrtError::from_sdk(err, bucket, key)).to_string(),
                })?;

            let e_tag: String = output
                .copy_part_result()
                .and_then(|r| r.e_tag())
                .map(str::to_string)
                .ok_or_else(|| StorageError::MultipartCopyFailed {
                    key: key.to_string(),
                    part_number: part.part_number,
                    message: "response carried no ETag".to_string(),
                })?;

            log::debug!(
                "Copied part {} of {} ({} bytes)",
                part.part_number,
                key,
                part.length
            );
            completed.push(
                CompletedPart::builder()
                    .part_number(part.part_number)
                    .e_tag(e_tag)
                    .build(),
            );
        }

        self.s3_client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .set_expected_bucket_owner(self.expected_bucket_owner.clone())
            .send()
            .await
            .map_err(|err| CrtError::from_sdk(err, bucket, key))?;

        Ok(())
    }
}

/// Headers of a source object replayed onto a multipart copy.
#[derive(Debug, Default)]
struct SourceHeaders {
    e_tag: Option<String>,
    content_type: Option<String>,
    content_encoding: Option<String>,
    content_disposition: Option<String>,
    content_language: Option<String>,
    cache_control: Option<String>,
    metadata: Option<HashMap<String, String>>,
}

/// Build the `x-amz-copy-source` value for an object, percent-encoding the key.
fn copy_source(bucket: &str, key: &str) -> String {
    let mut encoded = String::with_capacity(bucket.len() + key.len() + 1);
    encoded.push_str(bucket);
    encoded.push('/');
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(dt.secs(), dt.subsec_nanos())
}

#[async_trait]
impl ObjectStore for CrtStorageClient {
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, StorageError> {
        let response = self
            .s3_client
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix(prefix.map(str::to_string))
            .set_continuation_token(continuation_token.map(str::to_string))
            .set_expected_bucket_owner(self.expected_bucket_owner.clone())
            .send()
            .await
            .map_err(|err| CrtError::from_sdk(err, bucket, prefix.unwrap_or_default()))?;

        let mut objects: Vec<ObjectDescriptor> = Vec::with_capacity(response.contents().len());
        for obj in response.contents() {
            let key: &str = obj.key().unwrap_or_default();
            let last_modified = match obj.last_modified().and_then(to_chrono) {
                Some(ts) => ts,
                None => {
                    log::warn!("Skipping {} in {}: listing has no LastModified", key, bucket);
                    continue;
                }
            };

            objects.push(ObjectDescriptor {
                key: key.to_string(),
                last_modified,
                size: obj.size().map(|s| s.max(0) as u64).unwrap_or(0),
                tier: StorageTier::from_listing(obj.storage_class().map(|c| c.as_str())),
            });
        }

        let next_continuation_token: Option<String> = if response.is_truncated() == Some(true) {
            response.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ObjectPage {
            objects,
            next_continuation_token,
        })
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        keys: &[String],
    ) -> Result<DeleteOutcome, StorageError> {
        let identifiers: Vec<ObjectIdentifier> = keys
            .iter()
            .map(|key| {
                ObjectIdentifier::builder()
                    .key(key)
                    .build()
                    .map_err(|e| CrtError::RequestBuild(e.to_string()))
            })
            .collect::<Result<_, _>>()?;

        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .quiet(false)
            .build()
            .map_err(|e| CrtError::RequestBuild(e.to_string()))?;

        let response = self
            .s3_client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .set_expected_bucket_owner(self.expected_bucket_owner.clone())
            .send()
            .await
            .map_err(|err| CrtError::from_sdk(err, bucket, ""))?;

        let deleted: Vec<String> = response
            .deleted()
            .iter()
            .filter_map(|d| d.key().map(str::to_string))
            .collect();

        let rejected: Vec<RejectedKey> = response
            .errors()
            .iter()
            .map(|e| RejectedKey {
                key: e.key().unwrap_or_default().to_string(),
                code: e.code().unwrap_or("Unknown").to_string(),
                message: e.message().unwrap_or_default().to_string(),
            })
            .collect();

        Ok(DeleteOutcome { deleted, rejected })
    }

    async fn copy_object_in_place(
        &self,
        bucket: &str,
        key: &str,
        target_tier: &StorageTier,
    ) -> Result<(), StorageError> {
        self.s3_client
            .copy_object()
            .bucket(bucket)
            .key(key)
            .copy_source(copy_source(bucket, key))
            .storage_class(StorageClass::from(target_tier.as_str()))
            .metadata_directive(MetadataDirective::Copy)
            .set_expected_bucket_owner(self.expected_bucket_owner.clone())
            .set_expected_source_bucket_owner(self.expected_bucket_owner.clone())
            .send()
            .await
            .map_err(|err| CrtError::from_sdk(err, bucket, key))?;

        Ok(())
    }

    async fn chunked_copy(
        &self,
        bucket: &str,
        key: &str,
        target_tier: &StorageTier,
        parts: &[CopyPart],
    ) -> Result<(), StorageError> {
        let headers: SourceHeaders = self.head_for_copy(bucket, key).await?;

        let created = self
            .s3_client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .storage_class(StorageClass::from(target_tier.as_str()))
            .set_content_type(headers.content_type)
            .set_content_encoding(headers.content_encoding)
            .set_content_disposition(headers.content_disposition)
            .set_content_language(headers.content_language)
            .set_cache_control(headers.cache_control)
            .set_metadata(headers.metadata)
            .set_expected_bucket_owner(self.expected_bucket_owner.clone())
            .send()
            .await
            .map_err(|err| CrtError::from_sdk(err, bucket, key))?;

        let upload_id: String = created
            .upload_id()
            .map(str::to_string)
            .ok_or_else(|| StorageError::Other {
                message: format!("CreateMultipartUpload for {} returned no upload id", key),
            })?;

        let result = self
            .copy_parts_and_complete(bucket, key, &upload_id, headers.e_tag.as_deref(), parts)
            .await;

        if let Err(ref err) = result {
            // Nothing becomes visible until completion; aborting frees the copied parts.
            let abort = self
                .s3_client
                .abort_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(&upload_id)
                .set_expected_bucket_owner(self.expected_bucket_owner.clone())
                .send()
                .await;
            match abort {
                Ok(_) => log::warn!("Aborted multipart copy of {} after: {}", key, err),
                Err(abort_err) => log::error!(
                    "Failed to abort multipart upload {} for {}: {}",
                    upload_id,
                    key,
                    StorageError::from(CrtError::from_sdk(abort_err, bucket, key))
                ),
            }
        }

        result
    }

    async fn get_object_tags(&self, bucket: &str, key: &str) -> Result<TagSet, StorageError> {
        let response = self
            .s3_client
            .get_object_tagging()
            .bucket(bucket)
            .key(key)
            .set_expected_bucket_owner(self.expected_bucket_owner.clone())
            .send()
            .await
            .map_err(|err| CrtError::from_sdk(err, bucket, key))?;

        Ok(response
            .tag_set()
            .iter()
            .map(|t| Tag::new(t.key(), t.value()))
            .collect())
    }

    async fn put_object_tags(
        &self,
        bucket: &str,
        key: &str,
        tags: &TagSet,
    ) -> Result<(), StorageError> {
        let tag_set: Vec<aws_sdk_s3::types::Tag> = tags
            .iter()
            .map(|t| {
                aws_sdk_s3::types::Tag::builder()
                    .key(&t.key)
                    .value(&t.value)
                    .build()
                    .map_err(|e| CrtError::RequestBuild(e.to_string()))
            })
            .collect::<Result<_, _>>()?;

        let tagging = Tagging::builder()
            .set_tag_set(Some(tag_set))
            .build()
            .map_err(|e| CrtError::RequestBuild(e.to_string()))?;

        self.s3_client
            .put_object_tagging()
            .bucket(bucket)
            .key(key)
            .tagging(tagging)
            .set_expected_bucket_owner(self.expected_bucket_owner.clone())
            .send()
            .await
            .map_err(|err| CrtError::from_sdk(err, bucket, key))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crt_client_implements_object_store() {
        // This is a compile-time test to ensure the trait is implemented correctly
        fn assert_object_store<T: ObjectStore>() {}
        assert_object_store::<CrtStorageClient>();
    }

    #[test]
    fn test_copy_source_keeps_safe_characters() {
        assert_eq!(copy_source("bkt", "logs/2024/a-b_c.txt"), "bkt/logs/2024/a-b_c.txt");
    }

    #[test]
    fn test_copy_source_encodes_key() {
        assert_eq!(copy_source("bkt", "my file+1.txt"), "bkt/my%20file%2B1.txt");
        assert_eq!(copy_source("bkt", "é"), "bkt/%C3%A9");
    }

    #[test]
    fn test_to_chrono_keeps_subseconds() {
        let dt = aws_sdk_s3::primitives::DateTime::from_secs_and_nanos(1_700_000_000, 500);
        let converted = to_chrono(&dt).unwrap();
        assert_eq!(converted.timestamp(), 1_700_000_000);
        assert_eq!(converted.timestamp_subsec_nanos(), 500);
    }
}

//! Object storage access. Rows keep object keys; callers get short-lived
//! presigned GET URLs when a file must leave the service (to a director's
//! browser or to the AI gateway).

use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client as S3Client;
use tracing::debug;

use crate::config::Buckets;
use crate::errors::AppError;

#[derive(Clone)]
pub struct Storage {
    client: S3Client,
    buckets: Buckets,
    signed_url_ttl: Duration,
}

impl Storage {
    pub fn new(client: S3Client, buckets: Buckets, signed_url_ttl_secs: u64) -> Self {
        Self {
            client,
            buckets,
            signed_url_ttl: Duration::from_secs(signed_url_ttl_secs),
        }
    }

    /// Presigned GET URL for an object. Values that are already absolute URLs
    /// (rows written before keys were stored) are returned unchanged.
    pub async fn signed_url(&self, bucket: &str, key: &str) -> Result<String, AppError> {
        if is_absolute_url(key) {
            return Ok(key.to_string());
        }

        let presign = PresigningConfig::expires_in(self.signed_url_ttl)
            .map_err(|e| AppError::Storage(format!("invalid presign TTL: {e}")))?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key.trim_start_matches('/'))
            .presigned(presign)
            .await
            .map_err(|e| AppError::Storage(format!("presign {bucket}/{key} failed: {e}")))?;

        debug!("Presigned {bucket}/{key}");
        Ok(request.uri().to_string())
    }

    pub async fn application_video_url(&self, key: &str) -> Result<String, AppError> {
        self.signed_url(&self.buckets.application_videos, key).await
    }

    pub async fn audition_video_url(&self, key: &str) -> Result<String, AppError> {
        self.signed_url(&self.buckets.audition_videos, key).await
    }

    pub async fn forum_attachment_url(&self, key: &str) -> Result<String, AppError> {
        self.signed_url(&self.buckets.forum_attachments, key).await
    }
}

fn is_absolute_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

/// Validates a client-supplied object key before it is stored in a row.
pub fn validate_object_key(field: &str, key: &str) -> Result<(), AppError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    if is_absolute_url(key) {
        return Ok(());
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(AppError::Validation(format!(
            "{field} must be a relative storage key"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_key_is_valid() {
        assert!(validate_object_key("video_path", "u1/p1-video-1700000000.mp4").is_ok());
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(validate_object_key("video_path", "   ").is_err());
    }

    #[test]
    fn test_traversal_rejected() {
        assert!(validate_object_key("video_path", "u1/../../etc/passwd").is_err());
        assert!(validate_object_key("video_path", "/root.mp4").is_err());
    }

    #[test]
    fn test_absolute_url_accepted() {
        assert!(validate_object_key("video_path", "https://cdn.example/v.mp4").is_ok());
        assert!(is_absolute_url("http://localhost:9000/v.mp4"));
        assert!(!is_absolute_url("u1/v.mp4"));
    }
}

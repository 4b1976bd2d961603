//! S3 client implementation.

use std::path::Path;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Configuration for the S3 client.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region
    pub region: String,
    /// Optional public base URL (e.g. a CDN) used instead of the bucket
    /// endpoint when building artifact URLs
    pub public_url: Option<String>,
}

impl S3Config {
    /// Create config from environment variables.
    ///
    /// Returns `None` when the endpoint or credentials are absent: object
    /// storage is an optional collaborator and the store stays disabled.
    pub fn from_env() -> Option<Self> {
        let endpoint_url = std::env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty())?;
        let access_key_id = std::env::var("S3_ACCESS_KEY").ok().filter(|s| !s.is_empty())?;
        let secret_access_key = std::env::var("S3_SECRET_KEY").ok().filter(|s| !s.is_empty())?;

        Some(Self {
            endpoint_url,
            access_key_id,
            secret_access_key,
            bucket_name: std::env::var("S3_BUCKET").unwrap_or_else(|_| "rsvp".to_string()),
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            public_url: std::env::var("S3_PUBLIC_URL").ok().filter(|s| !s.is_empty()),
        })
    }

    /// The endpoint with an https scheme prepended when none was given.
    pub fn endpoint_with_scheme(&self) -> String {
        if self.endpoint_url.starts_with("http") {
            self.endpoint_url.clone()
        } else {
            format!("https://{}", self.endpoint_url)
        }
    }
}

/// S3-compatible storage client.
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    config: S3Config,
}

impl S3Client {
    /// Create a new client from configuration.
    pub fn new(config: S3Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "rsvp",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(config.endpoint_with_scheme())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            config,
        }
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Upload a file.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.config.bucket_name)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    /// Check whether an object exists.
    pub async fn object_exists(&self, key: &str) -> bool {
        self.client
            .head_object()
            .bucket(&self.config.bucket_name)
            .key(key)
            .send()
            .await
            .is_ok()
    }

    /// Delete an object.
    pub async fn delete_object(&self, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;

        debug!("Deleted object {}", key);
        Ok(())
    }

    /// Public URL for an object: the configured public base when present,
    /// otherwise the bucket endpoint.
    pub fn public_url(&self, key: &str) -> String {
        match &self.config.public_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => {
                let endpoint = self
                    .config
                    .endpoint_url
                    .trim_start_matches("https://")
                    .trim_start_matches("http://");
                format!("https://{}.{}/{}", self.config.bucket_name, endpoint, key)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> S3Config {
        S3Config {
            endpoint_url: "minio.local:9000".to_string(),
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
            bucket_name: "rsvp".to_string(),
            region: "us-east-1".to_string(),
            public_url: None,
        }
    }

    #[test]
    fn test_endpoint_scheme_prepended() {
        assert_eq!(
            config().endpoint_with_scheme(),
            "https://minio.local:9000"
        );

        let mut with_scheme = config();
        with_scheme.endpoint_url = "http://minio.local:9000".to_string();
        assert_eq!(with_scheme.endpoint_with_scheme(), "http://minio.local:9000");
    }

    #[test]
    fn test_public_url_from_bucket_endpoint() {
        let client = S3Client::new(config());
        assert_eq!(
            client.public_url("videos/abc/output.mp4"),
            "https://rsvp.minio.local:9000/videos/abc/output.mp4"
        );
    }

    #[test]
    fn test_public_url_prefers_cdn_base() {
        let mut cfg = config();
        cfg.public_url = Some("https://cdn.example.com/".to_string());
        let client = S3Client::new(cfg);
        assert_eq!(
            client.public_url("videos/abc/output.mp4"),
            "https://cdn.example.com/videos/abc/output.mp4"
        );
    }
}

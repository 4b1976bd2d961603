//! High-level artifact store keyed by job id.

use std::path::Path;

use rsvp_models::JobId;
use tracing::{info, warn};

use crate::client::{S3Client, S3Config};
use crate::error::StorageResult;

/// Object-storage layout for encoded videos.
fn artifact_key(job_id: &JobId) -> String {
    format!("videos/{}/output.mp4", job_id)
}

/// Artifact store for encoded videos, keyed by job id.
///
/// Wraps an optional [`S3Client`]: when object storage is not configured
/// every operation degrades gracefully and artifacts stay on local disk.
#[derive(Clone, Default)]
pub struct ArtifactStore {
    client: Option<S3Client>,
}

impl ArtifactStore {
    /// Build from the `S3_*` environment; disabled when unconfigured.
    pub fn from_env() -> Self {
        match S3Config::from_env() {
            Some(config) => {
                info!(
                    "Object storage enabled (bucket {})",
                    config.bucket_name
                );
                Self {
                    client: Some(S3Client::new(config)),
                }
            }
            None => {
                info!("Object storage not configured, artifacts stay local");
                Self { client: None }
            }
        }
    }

    /// A disabled store (used by tests and local-only deployments).
    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Upload a job's encoded artifact.
    ///
    /// Returns the object key, or `None` when storage is disabled.
    pub async fn upload(&self, local_path: &Path, job_id: &JobId) -> StorageResult<Option<String>> {
        let Some(client) = &self.client else {
            return Ok(None);
        };

        let key = artifact_key(job_id);
        client.upload_file(local_path, &key, "video/mp4").await?;
        Ok(Some(key))
    }

    /// Public URL for a job's artifact, or `None` when storage is disabled.
    pub fn url_for(&self, job_id: &JobId) -> Option<String> {
        self.client
            .as_ref()
            .map(|client| client.public_url(&artifact_key(job_id)))
    }

    /// Whether a remote artifact exists for the job.
    pub async fn exists(&self, job_id: &JobId) -> bool {
        match &self.client {
            Some(client) => client.object_exists(&artifact_key(job_id)).await,
            None => false,
        }
    }

    /// Delete a job's remote artifact. Returns true when nothing remains
    /// remotely (including when storage is disabled).
    pub async fn delete(&self, job_id: &JobId) -> bool {
        let Some(client) = &self.client else {
            return true;
        };

        match client.delete_object(&artifact_key(job_id)).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to delete remote artifact for {}: {}", job_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_store_degrades_gracefully() {
        let store = ArtifactStore::disabled();
        let job_id = JobId::new();

        assert!(!store.is_enabled());
        assert_eq!(
            store.upload(Path::new("/tmp/out.mp4"), &job_id).await.unwrap(),
            None
        );
        assert_eq!(store.url_for(&job_id), None);
        assert!(!store.exists(&job_id).await);
        assert!(store.delete(&job_id).await);
    }

    #[test]
    fn test_artifact_key_layout() {
        let job_id = JobId::from_string("abc-123");
        assert_eq!(artifact_key(&job_id), "videos/abc-123/output.mp4");
    }
}

//! Job payload delivered to workers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rsvp_models::{JobId, VideoConfig};

/// A video generation job.
///
/// Carries the normalized input text and a clamped configuration. The job
/// id keys the worker's working directory and every frame filename, so
/// re-delivery of the same job overwrites the same files: at-least-once
/// transport is safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateVideoJob {
    /// Unique job ID
    pub job_id: JobId,
    /// Normalized input text
    pub text: String,
    /// Clamped rendering configuration
    pub config: VideoConfig,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl GenerateVideoJob {
    /// Create a new job with a fresh id. `config` must already be clamped.
    pub fn new(text: impl Into<String>, config: VideoConfig) -> Self {
        Self {
            job_id: JobId::new(),
            text: text.into(),
            config,
            created_at: Utc::now(),
        }
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("generate:{}", self.job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_roundtrip() {
        let job = GenerateVideoJob::new("speed reading is great", VideoConfig::default().clamped());

        let json = serde_json::to_string(&job).expect("serialize job");
        let decoded: GenerateVideoJob = serde_json::from_str(&json).expect("deserialize job");

        assert_eq!(decoded.job_id, job.job_id);
        assert_eq!(decoded.text, job.text);
        assert_eq!(decoded.config, job.config);
        assert_eq!(decoded.created_at, job.created_at);
    }

    #[test]
    fn test_idempotency_key_tracks_job_id() {
        let job = GenerateVideoJob::new("text", VideoConfig::default());
        assert_eq!(job.idempotency_key(), format!("generate:{}", job.job_id));
    }
}

//! Job status store and cancellation flags.
//!
//! One JSON record per job id, written by the owning worker and read by
//! status pollers. Redis gives the single-writer/many-reader semantics the
//! pipeline requires; records expire a retention window after their last
//! update so abandoned jobs cannot accumulate.

use redis::AsyncCommands;
use tracing::debug;

use rsvp_models::{JobId, JobStatusRecord};

use crate::error::QueueResult;

/// Seconds a status record survives after its last update.
pub const STATUS_TTL_SECS: u64 = 3600;

/// Seconds a cancellation flag survives.
const CANCEL_TTL_SECS: u64 = 3600;

/// Redis-backed store for job status records.
#[derive(Clone)]
pub struct JobStatusStore {
    client: redis::Client,
    ttl_secs: u64,
}

impl JobStatusStore {
    /// Create a new store.
    pub fn new(redis_url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            ttl_secs: STATUS_TTL_SECS,
        })
    }

    /// Create from the `REDIS_URL` environment variable.
    pub fn from_env() -> QueueResult<Self> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        Self::new(&redis_url)
    }

    /// Override the retention TTL.
    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// The retention window applied to records.
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_secs as i64)
    }

    fn status_key(job_id: &JobId) -> String {
        format!("rsvp:status:{}", job_id)
    }

    fn cancel_key(job_id: &JobId) -> String {
        format!("rsvp:cancel:{}", job_id)
    }

    /// Write a record, refreshing its TTL.
    pub async fn put(&self, record: &JobStatusRecord) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(record)?;

        conn.set_ex::<_, _, ()>(Self::status_key(&record.job_id), payload, self.ttl_secs)
            .await?;

        debug!(
            "Wrote status {} for job {}",
            record.state.as_str(),
            record.job_id
        );
        Ok(())
    }

    /// Read a record. `None` means unknown or expired.
    pub async fn get(&self, job_id: &JobId) -> QueueResult<Option<JobStatusRecord>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = conn.get(Self::status_key(job_id)).await?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Delete a record, invalidating subsequent status queries.
    pub async fn delete(&self, job_id: &JobId) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(Self::status_key(job_id)).await?;
        Ok(())
    }

    /// Flag a job for best-effort cancellation.
    pub async fn request_cancel(&self, job_id: &JobId) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(Self::cancel_key(job_id), "1", CANCEL_TTL_SECS)
            .await?;
        debug!("Cancellation requested for job {}", job_id);
        Ok(())
    }

    /// Whether cancellation has been requested for a job.
    pub async fn is_cancel_requested(&self, job_id: &JobId) -> QueueResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let flagged: bool = conn.exists(Self::cancel_key(job_id)).await?;
        Ok(flagged)
    }

    /// Clear a job's cancellation flag.
    pub async fn clear_cancel(&self, job_id: &JobId) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(Self::cancel_key(job_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let job_id = JobId::from_string("abc");
        assert_eq!(JobStatusStore::status_key(&job_id), "rsvp:status:abc");
        assert_eq!(JobStatusStore::cancel_key(&job_id), "rsvp:cancel:abc");
    }

    #[test]
    fn test_retention_matches_ttl() {
        let store = JobStatusStore::new("redis://localhost:6379")
            .unwrap()
            .with_ttl(120);
        assert_eq!(store.retention(), chrono::Duration::seconds(120));
    }
}

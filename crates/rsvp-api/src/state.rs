//! Application state.

use std::sync::Arc;

use rsvp_queue::{JobQueue, JobStatusStore};
use rsvp_storage::ArtifactStore;

use crate::config::ApiConfig;
use crate::error::ApiError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub queue: Arc<JobQueue>,
    pub status: Arc<JobStatusStore>,
    pub storage: Arc<ArtifactStore>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let queue = JobQueue::from_env()?;
        let status = JobStatusStore::from_env()?;
        let storage = ArtifactStore::from_env();

        Ok(Self {
            config,
            queue: Arc::new(queue),
            status: Arc::new(status),
            storage: Arc::new(storage),
        })
    }
}

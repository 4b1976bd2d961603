//! Error types for queue operations.

use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors that can occur in queue or status-store operations.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Enqueue failed: {0}")]
    EnqueueFailed(String),

    #[error("Invalid job state transition: {0}")]
    InvalidTransition(#[from] rsvp_models::TransitionError),
}

impl QueueError {
    pub fn enqueue_failed(message: impl Into<String>) -> Self {
        Self::EnqueueFailed(message.into())
    }
}

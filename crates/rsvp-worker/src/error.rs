//! Worker error types.

use thiserror::Error;

/// Result type for worker operations.
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors that abort a job or the worker itself.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Content rejected: {0}")]
    Content(#[from] rsvp_models::ContentError),

    #[error("Render error: {0}")]
    Render(#[from] rsvp_render::RenderError),

    #[error("Storage error: {0}")]
    Storage(#[from] rsvp_storage::StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] rsvp_queue::QueueError),

    #[error("Job state error: {0}")]
    Transition(#[from] rsvp_models::TransitionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    /// The human-readable cause stored on a failed job.
    pub fn failure_message(&self) -> String {
        match self {
            WorkerError::Render(rsvp_render::RenderError::EncodeFailed { message, .. }) => {
                format!("FFmpeg error: {}", message)
            }
            other => other.to_string(),
        }
    }
}

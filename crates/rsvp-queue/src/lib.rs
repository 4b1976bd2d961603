//! Redis Streams job queue and status store.
//!
//! This crate provides:
//! - Job enqueueing and worker consumption via Redis Streams
//! - The per-job status record read by pollers and written by the owning
//!   worker
//! - Best-effort cancellation flags

pub mod error;
pub mod job;
pub mod queue;
pub mod status;

pub use error::{QueueError, QueueResult};
pub use job::GenerateVideoJob;
pub use queue::{JobQueue, QueueConfig};
pub use status::JobStatusStore;

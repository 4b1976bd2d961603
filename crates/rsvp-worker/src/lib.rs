//! Video generation worker.
//!
//! Consumes [`rsvp_queue::GenerateVideoJob`]s and drives each one through
//! the full pipeline: segmentation, frame rendering, encoding, and optional
//! artifact upload, publishing progress to the status store throughout.

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod pipeline;
pub mod progress;
pub mod reaper;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use pipeline::ProcessingContext;
pub use reaper::Reaper;

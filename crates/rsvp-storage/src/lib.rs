//! S3-compatible artifact storage.
//!
//! Encoded videos are optionally promoted from the worker's disk to an
//! S3-compatible bucket (MinIO locally, any S3 endpoint in production).
//! When the `S3_*` environment is absent the store is disabled and every
//! operation is a no-op, leaving artifacts served from local disk.

pub mod client;
pub mod error;
pub mod store;

pub use client::{S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use store::ArtifactStore;

//! Job identity and the typed job state machine.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a job.
///
/// The id also keys the job's working directory, so re-delivery of the same
/// job overwrites the same files instead of duplicating work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a finished video artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactRef {
    /// Artifact on the worker's local disk, served through the API
    Local { path: PathBuf },
    /// Artifact promoted to object storage
    Remote { key: String, url: String },
}

impl ArtifactRef {
    pub fn is_remote(&self) -> bool {
        matches!(self, ArtifactRef::Remote { .. })
    }

    /// The URL a caller should be pointed at, given the API download route
    /// for locally held artifacts.
    pub fn download_url(&self, job_id: &JobId) -> String {
        match self {
            ArtifactRef::Local { .. } => format!("/api/download/{}", job_id),
            ArtifactRef::Remote { url, .. } => url.clone(),
        }
    }
}

/// Lifecycle state of a job.
///
/// Transitions are one-way: `Pending -> Progress -> {Success, Failure}`.
/// Each state carries exactly the data callers may observe in it, so status
/// responses cannot grow ad hoc fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    /// Accepted, not yet started
    Pending,
    /// Actively segmenting, rendering, or encoding
    Progress {
        current: u64,
        total: u64,
        percent: u8,
        message: String,
    },
    /// Terminal: artifact available
    Success {
        word_count: u64,
        artifact: ArtifactRef,
    },
    /// Terminal: human-readable cause
    Failure { message: String },
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Progress { .. } => "progress",
            JobState::Success { .. } => "success",
            JobState::Failure { .. } => "failure",
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Success { .. } | JobState::Failure { .. })
    }

    /// Completion percentage shown to pollers.
    pub fn percent(&self) -> u8 {
        match self {
            JobState::Pending => 0,
            JobState::Progress { percent, .. } => *percent,
            JobState::Success { .. } => 100,
            JobState::Failure { .. } => 0,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejected state transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid job state transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: &'static str,
    pub to: &'static str,
}

/// Status record for a job, stored in the status store and polled by
/// callers.
///
/// The owning worker is the single writer; [`JobStatusRecord::transition`]
/// refuses to leave a terminal state, so a finished job's outcome can never
/// be overwritten by a late update.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobStatusRecord {
    /// Job this record describes
    pub job_id: JobId,
    /// Current lifecycle state
    #[serde(flatten)]
    pub state: JobState,
    /// When the job was accepted
    pub created_at: DateTime<Utc>,
    /// When the record was last written
    pub updated_at: DateTime<Utc>,
    /// When the job's files and record become eligible for the reaper;
    /// set on the terminal transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl JobStatusRecord {
    /// Create a new record in the `Pending` state.
    pub fn new(job_id: JobId) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            state: JobState::Pending,
            created_at: now,
            updated_at: now,
            expires_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Apply a state transition, enforcing one-way progression.
    ///
    /// `Progress -> Progress` is allowed (counter updates); any transition
    /// out of a terminal state is rejected.
    pub fn transition(&mut self, next: JobState) -> Result<(), TransitionError> {
        if self.state.is_terminal() {
            return Err(TransitionError {
                from: self.state.as_str(),
                to: next.as_str(),
            });
        }
        if matches!(next, JobState::Pending) {
            return Err(TransitionError {
                from: self.state.as_str(),
                to: next.as_str(),
            });
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record a progress update.
    pub fn progress(
        &mut self,
        current: u64,
        total: u64,
        percent: u8,
        message: impl Into<String>,
    ) -> Result<(), TransitionError> {
        self.transition(JobState::Progress {
            current,
            total,
            percent: percent.min(100),
            message: message.into(),
        })
    }

    /// Mark the job as succeeded.
    pub fn succeed(
        &mut self,
        word_count: u64,
        artifact: ArtifactRef,
    ) -> Result<(), TransitionError> {
        self.transition(JobState::Success {
            word_count,
            artifact,
        })
    }

    /// Mark the job as failed with a human-readable cause.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(JobState::Failure {
            message: message.into(),
        })
    }

    /// Schedule the record (and the job's files) for removal after the
    /// retention window.
    pub fn expire_after(&mut self, retention: chrono::Duration) {
        self.expires_at = Some(Utc::now() + retention);
    }

    /// Whether the reaper may remove this job's remains.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_happy_path() {
        let mut record = JobStatusRecord::new(JobId::new());
        assert_eq!(record.state, JobState::Pending);
        assert!(!record.is_terminal());

        record.progress(0, 4, 0, "Generating frames (0/4)").unwrap();
        record.progress(4, 4, 85, "Encoding video...").unwrap();

        record
            .succeed(
                4,
                ArtifactRef::Local {
                    path: PathBuf::from("/tmp/rsvp_videos/x/output.mp4"),
                },
            )
            .unwrap();
        assert!(record.is_terminal());
        assert_eq!(record.state.percent(), 100);
    }

    #[test]
    fn test_terminal_states_refuse_overwrite() {
        let mut record = JobStatusRecord::new(JobId::new());
        record.fail("FFmpeg error: boom").unwrap();
        assert!(record.is_terminal());

        let err = record.progress(1, 2, 40, "late update").unwrap_err();
        assert_eq!(err.from, "failure");
        assert_eq!(err.to, "progress");

        // And no state may re-enter Pending.
        let mut record = JobStatusRecord::new(JobId::new());
        record.progress(0, 1, 0, "start").unwrap();
        assert!(record.transition(JobState::Pending).is_err());
    }

    #[test]
    fn test_failure_carries_message() {
        let mut record = JobStatusRecord::new(JobId::new());
        record.fail("Render I/O failure").unwrap();
        match &record.state {
            JobState::Failure { message } => assert!(!message.is_empty()),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn test_expiry() {
        let mut record = JobStatusRecord::new(JobId::new());
        assert!(!record.is_expired(Utc::now()));

        record.expire_after(chrono::Duration::seconds(-1));
        assert!(record.is_expired(Utc::now()));
    }

    #[test]
    fn test_state_serialization_is_tagged() {
        let state = JobState::Progress {
            current: 100,
            total: 400,
            percent: 20,
            message: "Generating frames (100/400)".into(),
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "progress");
        assert_eq!(json["percent"], 20);

        let back: JobState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_artifact_download_url() {
        let job_id = JobId::from_string("abc");
        let local = ArtifactRef::Local {
            path: PathBuf::from("/tmp/x/output.mp4"),
        };
        assert_eq!(local.download_url(&job_id), "/api/download/abc");

        let remote = ArtifactRef::Remote {
            key: "videos/abc/output.mp4".into(),
            url: "https://bucket.example.com/videos/abc/output.mp4".into(),
        };
        assert_eq!(
            remote.download_url(&job_id),
            "https://bucket.example.com/videos/abc/output.mp4"
        );
    }
}

//! Expiry sweep for job directories.
//!
//! Terminal jobs carry an explicit `expires_at`; this task periodically
//! walks the work directory and removes job directories whose records are
//! expired or gone. Retention survives worker restarts because nothing
//! depends on in-process timers.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use rsvp_models::JobId;
use rsvp_queue::JobStatusStore;

/// Periodic reaper over the worker's job directories.
pub struct Reaper {
    work_dir: PathBuf,
    status: JobStatusStore,
    interval: Duration,
}

impl Reaper {
    pub fn new(work_dir: impl Into<PathBuf>, status: JobStatusStore, interval: Duration) -> Self {
        Self {
            work_dir: work_dir.into(),
            status,
            interval,
        }
    }

    /// Run the sweep loop forever.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick fires immediately; skip it so a restarting worker
        // finishes its setup before the first sweep.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep().await {
                warn!("Reaper sweep failed: {}", e);
            }
        }
    }

    /// Remove every expired or orphaned job directory.
    pub async fn sweep(&self) -> std::io::Result<()> {
        let mut entries = match tokio::fs::read_dir(&self.work_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        let now = Utc::now();
        let mut removed = 0usize;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let job_id = JobId::from_string(name);

            let expired = match self.status.get(&job_id).await {
                // Record gone: the retention TTL already elapsed (or the
                // job was deleted); the directory is an orphan.
                Ok(None) => true,
                Ok(Some(record)) => record.is_terminal() && record.is_expired(now),
                Err(e) => {
                    warn!("Reaper status lookup failed for {}: {}", job_id, e);
                    false
                }
            };

            if expired {
                debug!("Reaping job directory {}", entry.path().display());
                if let Err(e) = tokio::fs::remove_dir_all(entry.path()).await {
                    warn!("Failed to reap {}: {}", entry.path().display(), e);
                    continue;
                }
                let _ = self.status.delete(&job_id).await;
                removed += 1;
            }
        }

        if removed > 0 {
            info!("Reaped {} expired job directories", removed);
        }
        Ok(())
    }
}

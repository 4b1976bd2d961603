//! The job pipeline: segment, render, sequence, encode, publish.
//!
//! Stages run sequentially inside one worker slot. The status record is
//! updated as a publish-and-continue side effect; the only shared resource
//! is that record, which pollers read while this pipeline is its single
//! writer.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tracing::warn;

use rsvp_models::{ArtifactRef, JobId, JobStatusRecord};
use rsvp_queue::{GenerateVideoJob, JobStatusStore};
use rsvp_render::{
    FontLibrary, FrameCompositor, FrameSequence, RenderError, TextSegmenter, VideoEncoder,
};
use rsvp_storage::ArtifactStore;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::progress::{self, PROGRESS_STRIDE};

/// Interval at which an active pipeline polls its cancellation flag.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Shared dependencies for job processing.
pub struct ProcessingContext {
    pub config: WorkerConfig,
    pub status: JobStatusStore,
    pub storage: ArtifactStore,
    pub fonts: FontLibrary,
}

impl ProcessingContext {
    /// Build the context from the environment.
    pub fn new(config: WorkerConfig) -> WorkerResult<Self> {
        Ok(Self {
            config,
            status: JobStatusStore::from_env()?,
            storage: ArtifactStore::from_env(),
            fonts: FontLibrary::with_system_defaults(),
        })
    }

    /// The working directory owned exclusively by one job.
    pub fn job_dir(&self, job_id: &JobId) -> PathBuf {
        PathBuf::from(&self.config.work_dir).join(job_id.as_str())
    }
}

/// Terminal output of a successful pipeline run.
struct PipelineOutput {
    word_count: u64,
    artifact: ArtifactRef,
}

/// Single-writer handle over a job's status record.
struct StatusWriter {
    store: JobStatusStore,
    record: Mutex<JobStatusRecord>,
}

impl StatusWriter {
    async fn progress(
        &self,
        current: u64,
        total: u64,
        percent: u8,
        message: impl Into<String>,
    ) -> WorkerResult<()> {
        let mut record = self.record.lock().await;
        record.progress(current, total, percent, message)?;
        self.store.put(&record).await?;
        Ok(())
    }

    async fn succeed(
        &self,
        word_count: u64,
        artifact: ArtifactRef,
        retention: chrono::Duration,
    ) -> WorkerResult<()> {
        let mut record = self.record.lock().await;
        record.succeed(word_count, artifact)?;
        record.expire_after(retention);
        self.store.put(&record).await?;
        Ok(())
    }

    async fn fail(&self, message: impl Into<String>, retention: chrono::Duration) -> WorkerResult<()> {
        let mut record = self.record.lock().await;
        record.fail(message)?;
        record.expire_after(retention);
        self.store.put(&record).await?;
        Ok(())
    }
}

/// Process one generation job end to end.
///
/// Returns `Ok` for completed, cancelled, and skipped (already terminal)
/// jobs; `Err` only for jobs that transitioned to `Failure`, so the
/// executor can log the cause. No outcome is retried.
pub async fn process_generate_job(
    ctx: &Arc<ProcessingContext>,
    job: &GenerateVideoJob,
) -> WorkerResult<()> {
    let logger = JobLogger::new(&job.job_id, "generate_video");
    logger.log_start(&format!(
        "Generating video at {} wpm, grouping {}",
        job.config.wpm, job.config.word_grouping
    ));

    let job_dir = ctx.job_dir(&job.job_id);

    // Re-delivery of a finished job is a no-op.
    let record = match ctx.status.get(&job.job_id).await? {
        Some(existing) if existing.is_terminal() => {
            logger.log_progress("Job already terminal, skipping re-delivery");
            return Ok(());
        }
        Some(existing) => existing,
        None => JobStatusRecord::new(job.job_id.clone()),
    };

    // Deleted while still queued: nothing to process.
    if ctx.status.is_cancel_requested(&job.job_id).await? {
        logger.log_progress("Job cancelled before start");
        ctx.status.clear_cancel(&job.job_id).await?;
        remove_job_dir(&job_dir, &logger).await;
        return Ok(());
    }

    let writer = Arc::new(StatusWriter {
        store: ctx.status.clone(),
        record: Mutex::new(record),
    });

    // Flip a watch flag when deletion is requested mid-flight; the render
    // loop polls it and the encoder kills FFmpeg on it.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let watcher = spawn_cancel_watcher(ctx.status.clone(), job.job_id.clone(), cancel_tx);

    let result = run_pipeline(ctx, job, &job_dir, &writer, cancel_rx, &logger).await;
    watcher.abort();

    // A delete can land between the last cancellation poll and the
    // terminal write; publishing Success then would resurrect the record
    // the caller just invalidated.
    let cancelled_late = result.is_ok()
        && ctx
            .status
            .is_cancel_requested(&job.job_id)
            .await
            .unwrap_or(false);

    match result {
        Ok(_) if cancelled_late => cancel_cleanup(ctx, job, &job_dir, &logger).await,
        Ok(output) => {
            writer
                .succeed(output.word_count, output.artifact, ctx.status.retention())
                .await?;
            logger.log_completion(&format!("{} words rendered", output.word_count));
            Ok(())
        }
        Err(WorkerError::Render(RenderError::Cancelled)) => {
            cancel_cleanup(ctx, job, &job_dir, &logger).await
        }
        Err(e) => {
            // Partial artifacts are removed before the Failure transition,
            // so a failed job never leaves anything retrievable.
            remove_job_dir(&job_dir, &logger).await;
            let message = e.failure_message();
            logger.log_error(&message);
            if let Err(put_err) = writer.fail(message, ctx.status.retention()).await {
                logger.log_warning(&format!("Failed to record failure: {}", put_err));
            }
            Err(e)
        }
    }
}

async fn run_pipeline(
    ctx: &Arc<ProcessingContext>,
    job: &GenerateVideoJob,
    job_dir: &Path,
    writer: &Arc<StatusWriter>,
    cancel_rx: watch::Receiver<bool>,
    logger: &JobLogger,
) -> WorkerResult<PipelineOutput> {
    let frames_dir = job_dir.join("frames");
    tokio::fs::create_dir_all(&frames_dir).await?;

    // Segmentation re-checks the content limits; a raw enqueue that
    // bypassed the API still fails before any frame is rendered.
    let segmenter = TextSegmenter::from_config(&job.config);
    let groups = segmenter.segment(&job.text)?;
    let total = groups.len();
    let word_count: u64 = groups.iter().map(|g| g.word_count() as u64).sum();

    let compositor = Arc::new(FrameCompositor::new(&job.config, &ctx.fonts));
    let mut sequence = FrameSequence::new();

    // Frame rendering fills the 0-80 band, one status write per stride.
    for (chunk_index, chunk) in groups.chunks(PROGRESS_STRIDE).enumerate() {
        if *cancel_rx.borrow() {
            return Err(RenderError::Cancelled.into());
        }

        let start = chunk_index * PROGRESS_STRIDE;
        writer
            .progress(
                start as u64,
                total as u64,
                progress::render_percent(start, total),
                format!("Generating frames ({}/{})", start, total),
            )
            .await?;

        let tasks: Vec<(PathBuf, String, f64)> = chunk
            .iter()
            .enumerate()
            .map(|(offset, group)| {
                let path = frames_dir.join(format!("frame_{:06}.png", start + offset));
                (path, group.text().to_string(), group.duration())
            })
            .collect();

        let compositor = Arc::clone(&compositor);
        let rendered = tokio::task::spawn_blocking(move || -> Result<Vec<(PathBuf, f64)>, RenderError> {
            let mut out = Vec::with_capacity(tasks.len());
            for (path, text, duration) in tasks {
                compositor.compose(&text, &path)?;
                out.push((path, duration));
            }
            Ok(out)
        })
        .await
        .map_err(std::io::Error::other)??;

        for (path, duration) in rendered {
            sequence.push(path, duration);
        }
    }

    let manifest_path = job_dir.join("concat.txt");
    sequence.write_concat_manifest(&manifest_path).await?;
    let planned_runtime = sequence.total_duration();

    writer
        .progress(
            total as u64,
            total as u64,
            progress::ENCODE_BAND_START,
            "Encoding video...",
        )
        .await?;

    // FFmpeg's progress stream maps into the 85-95 band; updates are
    // forwarded from the callback through a channel since the callback
    // itself cannot await.
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<f64>();
    let encode_writer = Arc::clone(writer);
    let total_u = total as u64;
    let encode_progress_task = tokio::spawn(async move {
        let mut last = progress::ENCODE_BAND_START;
        while let Some(fraction) = progress_rx.recv().await {
            let percent = progress::encode_percent(fraction);
            if percent > last {
                last = percent;
                let _ = encode_writer
                    .progress(total_u, total_u, percent, "Encoding video...")
                    .await;
            }
        }
    });

    let output_path = job_dir.join("output.mp4");
    let encoder = VideoEncoder::new().with_cancel(cancel_rx.clone());
    let encode_result = encoder
        .encode(&manifest_path, &output_path, planned_runtime, move |fraction| {
            let _ = progress_tx.send(fraction);
        })
        .await;

    let _ = encode_progress_task.await;
    encode_result?;

    // Frames are deleted as soon as the encoder has consumed them,
    // whether or not the artifact is later promoted to remote storage.
    if let Err(e) = tokio::fs::remove_dir_all(&frames_dir).await {
        logger.log_warning(&format!("Failed to remove frames: {}", e));
    }

    let artifact = promote_artifact(ctx, job, &output_path, writer, total as u64, logger).await?;

    Ok(PipelineOutput {
        word_count,
        artifact,
    })
}

/// Upload the encoded artifact when storage is enabled; on success the
/// local copy is removed. Upload failure is not fatal: the job completes
/// with a locally served artifact.
async fn promote_artifact(
    ctx: &Arc<ProcessingContext>,
    job: &GenerateVideoJob,
    output_path: &Path,
    writer: &Arc<StatusWriter>,
    total: u64,
    logger: &JobLogger,
) -> WorkerResult<ArtifactRef> {
    if !ctx.storage.is_enabled() {
        return Ok(ArtifactRef::Local {
            path: output_path.to_path_buf(),
        });
    }

    writer
        .progress(
            total,
            total,
            progress::UPLOAD_PERCENT,
            "Uploading to cloud storage...",
        )
        .await?;

    match ctx.storage.upload(output_path, &job.job_id).await {
        Ok(Some(key)) => {
            let url = ctx
                .storage
                .url_for(&job.job_id)
                .unwrap_or_else(|| format!("/api/download/{}", job.job_id));
            if let Err(e) = tokio::fs::remove_file(output_path).await {
                logger.log_warning(&format!("Failed to remove local artifact: {}", e));
            }
            Ok(ArtifactRef::Remote { key, url })
        }
        Ok(None) => Ok(ArtifactRef::Local {
            path: output_path.to_path_buf(),
        }),
        Err(e) => {
            logger.log_warning(&format!("Upload failed, serving locally: {}", e));
            Ok(ArtifactRef::Local {
                path: output_path.to_path_buf(),
            })
        }
    }
}

/// Tear down a cancelled job: working files, remote artifact, status
/// record, and the flag itself. Subsequent status polls see not-found.
async fn cancel_cleanup(
    ctx: &Arc<ProcessingContext>,
    job: &GenerateVideoJob,
    job_dir: &Path,
    logger: &JobLogger,
) -> WorkerResult<()> {
    logger.log_progress("Job cancelled, removing working files");
    remove_job_dir(job_dir, logger).await;
    ctx.storage.delete(&job.job_id).await;
    ctx.status.delete(&job.job_id).await?;
    ctx.status.clear_cancel(&job.job_id).await?;
    Ok(())
}

/// Poll the cancellation flag and flip the watch channel once set.
fn spawn_cancel_watcher(
    store: JobStatusStore,
    job_id: JobId,
    cancel_tx: watch::Sender<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
            match store.is_cancel_requested(&job_id).await {
                Ok(true) => {
                    let _ = cancel_tx.send(true);
                    break;
                }
                Ok(false) => {}
                Err(e) => warn!("Cancellation poll failed for {}: {}", job_id, e),
            }
        }
    })
}

/// Remove a job's working directory, logging (not failing) on error.
async fn remove_job_dir(job_dir: &Path, logger: &JobLogger) {
    if let Err(e) = tokio::fs::remove_dir_all(job_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            logger.log_warning(&format!("Failed to remove working directory: {}", e));
        }
    }
}

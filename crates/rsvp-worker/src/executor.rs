//! Job executor.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

use rsvp_queue::{GenerateVideoJob, JobQueue};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::pipeline::{process_generate_job, ProcessingContext};

/// Job executor that processes jobs from the queue.
///
/// A semaphore bounds concurrent jobs; each job's pipeline stages run
/// sequentially inside its permit, so one slot is occupied for a job's
/// full runtime including the external encode.
pub struct JobExecutor {
    config: WorkerConfig,
    queue: Arc<JobQueue>,
    ctx: Arc<ProcessingContext>,
    job_semaphore: Arc<Semaphore>,
    consumer_name: String,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(config: WorkerConfig, queue: JobQueue) -> WorkerResult<Self> {
        let ctx = Arc::new(ProcessingContext::new(config.clone())?);
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let consumer_name = format!("worker-{}", Uuid::new_v4());

        Ok(Self {
            config,
            queue: Arc::new(queue),
            ctx,
            job_semaphore,
            consumer_name,
        })
    }

    /// Run until a shutdown signal arrives.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting job executor '{}' with {} max concurrent jobs",
            self.consumer_name, self.config.max_concurrent_jobs
        );

        self.queue.init().await?;

        // Periodically claim jobs abandoned by crashed workers;
        // re-execution is idempotent so re-delivery is safe.
        let claim_task = self.spawn_claim_task();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, stopping executor");
                    break;
                }
                result = self.consume_jobs() => {
                    if let Err(e) = result {
                        error!("Error consuming jobs: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        info!("Waiting for in-flight jobs to complete...");
        let _ = tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs()).await;

        info!("Job executor stopped");
        Ok(())
    }

    /// Consume and dispatch jobs from the queue.
    async fn consume_jobs(&self) -> WorkerResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            // All slots busy, wait a bit
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        let jobs = self
            .queue
            .consume(&self.consumer_name, 1000, available.min(5))
            .await?;

        for (message_id, job) in jobs {
            self.dispatch(message_id, job).await;
        }

        Ok(())
    }

    /// Run one job on a semaphore slot.
    async fn dispatch(&self, message_id: String, job: GenerateVideoJob) {
        let permit = match Arc::clone(&self.job_semaphore).acquire_owned().await {
            Ok(p) => p,
            Err(_) => return,
        };

        let ctx = Arc::clone(&self.ctx);
        let queue = Arc::clone(&self.queue);

        tokio::spawn(async move {
            let _permit = permit;

            if let Err(e) = process_generate_job(&ctx, &job).await {
                error!("Job {} failed: {}", job.job_id, e);
            }

            // Failed jobs are acked too: failures are terminal and callers
            // resubmit instead of the queue retrying.
            if let Err(e) = queue.ack(&message_id).await {
                warn!("Failed to ack message {}: {}", message_id, e);
            }
        });
    }

    /// Spawn the periodic pending-claim task.
    fn spawn_claim_task(&self) -> tokio::task::JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let ctx = Arc::clone(&self.ctx);
        let semaphore = Arc::clone(&self.job_semaphore);
        let consumer_name = self.consumer_name.clone();
        let claim_interval = self.config.claim_interval;
        let min_idle_ms = self.config.claim_min_idle.as_millis() as u64;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(claim_interval);
            loop {
                interval.tick().await;

                match queue.claim_pending(&consumer_name, min_idle_ms, 5).await {
                    Ok(jobs) if !jobs.is_empty() => {
                        info!("Claimed {} pending jobs", jobs.len());
                        for (message_id, job) in jobs {
                            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                                Ok(p) => p,
                                Err(_) => break,
                            };
                            let ctx = Arc::clone(&ctx);
                            let queue = Arc::clone(&queue);

                            tokio::spawn(async move {
                                let _permit = permit;
                                if let Err(e) = process_generate_job(&ctx, &job).await {
                                    error!("Claimed job {} failed: {}", job.job_id, e);
                                }
                                if let Err(e) = queue.ack(&message_id).await {
                                    warn!("Failed to ack message {}: {}", message_id, e);
                                }
                            });
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Failed to claim pending jobs: {}", e),
                }
            }
        })
    }

    /// Block until every job slot is free again.
    async fn wait_for_jobs(&self) {
        let _ = self
            .job_semaphore
            .acquire_many(self.config.max_concurrent_jobs as u32)
            .await;
    }
}

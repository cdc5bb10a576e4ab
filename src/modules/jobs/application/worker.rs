/// Fixed-concurrency consumer of the job queue.
///
/// Each worker loops: claim, execute with a per-attempt timeout, record the
/// terminal outcome, publish. The queue's claim guarantees at-most-one active
/// worker per job; workers share nothing else.
use crate::modules::jobs::application::pipeline::ScrapePipeline;
use crate::modules::jobs::domain::{JobQueue, JobStatus, RetryDisposition, ScrapeJob};
use crate::modules::notify::{JobEvent, ProgressPublisher};
use crate::shared::errors::AppError;
use crate::{log_debug, log_error, log_info, log_warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How often a terminal write (complete / fail_or_retry) is attempted before
/// the worker gives up and leaves recovery to the stall sweep
const TERMINAL_WRITE_ATTEMPTS: usize = 3;
const TERMINAL_WRITE_DELAY: Duration = Duration::from_millis(250);

/// Slack on top of the attempt timeout before a processing row counts as
/// stalled; live attempts are bounded by the timeout, so anything older
/// belongs to a worker that died or could not record its outcome
const STALL_GRACE: Duration = Duration::from_secs(60);

pub struct WorkerPool {
    queue: Arc<dyn JobQueue>,
    pipeline: Arc<ScrapePipeline>,
    publisher: Arc<dyn ProgressPublisher>,
    concurrency: usize,
    poll_interval: Duration,
    attempt_timeout: Duration,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        pipeline: Arc<ScrapePipeline>,
        publisher: Arc<dyn ProgressPublisher>,
        concurrency: usize,
        poll_interval: Duration,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            pipeline,
            publisher,
            concurrency: concurrency.max(1),
            poll_interval,
            attempt_timeout,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between jobs; in-flight attempts are allowed to finish.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run all workers until the shutdown flag is raised.
    pub async fn run(&self) {
        log_info!("Starting worker pool with {} workers", self.concurrency);
        let mut handles = Vec::with_capacity(self.concurrency + 1);
        handles.push(self.spawn_stall_sweep());
        for worker_id in 0..self.concurrency {
            let ctx = WorkerContext {
                queue: Arc::clone(&self.queue),
                pipeline: Arc::clone(&self.pipeline),
                publisher: Arc::clone(&self.publisher),
                poll_interval: self.poll_interval,
                attempt_timeout: self.attempt_timeout,
                shutdown: Arc::clone(&self.shutdown),
            };
            handles.push(tokio::spawn(async move {
                ctx.worker_loop(worker_id).await;
            }));
        }
        for outcome in futures::future::join_all(handles).await {
            if let Err(e) = outcome {
                log_error!("Worker task panicked: {}", e);
            }
        }
        log_info!("Worker pool stopped");
    }

    /// Periodic sweep returning jobs stuck in processing to the queue, so a
    /// crashed worker or a lost terminal write never wedges a job forever.
    fn spawn_stall_sweep(&self) -> tokio::task::JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let shutdown = Arc::clone(&self.shutdown);
        let stalled_after = chrono::Duration::from_std(self.attempt_timeout + STALL_GRACE)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        let interval = self.poll_interval;
        tokio::spawn(async move {
            while !shutdown.load(Ordering::Relaxed) {
                match queue.reclaim_stalled(stalled_after).await {
                    Ok(0) => {}
                    Ok(reclaimed) => log_warn!("Recovered {} stalled jobs", reclaimed),
                    Err(e) => log_error!("Stall sweep failed: {}", e),
                }
                tokio::time::sleep(interval).await;
            }
        })
    }
}

struct WorkerContext {
    queue: Arc<dyn JobQueue>,
    pipeline: Arc<ScrapePipeline>,
    publisher: Arc<dyn ProgressPublisher>,
    poll_interval: Duration,
    attempt_timeout: Duration,
    shutdown: Arc<AtomicBool>,
}

impl WorkerContext {
    async fn worker_loop(&self, worker_id: usize) {
        log_debug!("Worker {} started", worker_id);
        while !self.shutdown.load(Ordering::Relaxed) {
            match self.queue.claim().await {
                Ok(Some(job)) => {
                    log_info!(
                        "Worker {} claimed {} job {} (attempt {}/{})",
                        worker_id,
                        job.spec.kind_name(),
                        job.id,
                        job.attempts,
                        job.max_attempts
                    );
                    self.process(job).await;
                }
                Ok(None) => {
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => {
                    log_error!("Worker {} failed to poll queue: {}", worker_id, e);
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
        log_debug!("Worker {} stopped", worker_id);
    }

    async fn process(&self, job: ScrapeJob) {
        self.publisher
            .publish(&JobEvent::JobUpdated {
                job_id: job.id,
                status: JobStatus::Processing,
                progress: 0,
            })
            .await;

        let attempt = tokio::time::timeout(self.attempt_timeout, self.pipeline.execute(&job));
        let outcome = match attempt.await {
            Ok(result) => result,
            Err(_) => Err(AppError::Transient(format!(
                "Attempt timed out after {}s",
                self.attempt_timeout.as_secs()
            ))),
        };

        match outcome {
            Ok(result) => self.finish_success(&job, result).await,
            Err(e) => self.finish_failure(&job, e).await,
        }
    }

    async fn finish_success(&self, job: &ScrapeJob, result: serde_json::Value) {
        for attempt in 1..=TERMINAL_WRITE_ATTEMPTS {
            match self.queue.complete(job.id, result.clone()).await {
                Ok(()) => {
                    self.publisher
                        .publish(&JobEvent::JobCompleted {
                            job_id: job.id,
                            result: result.clone(),
                        })
                        .await;
                    return;
                }
                Err(e) if attempt < TERMINAL_WRITE_ATTEMPTS => {
                    log_warn!(
                        "Failed to mark job {} completed (attempt {}): {}",
                        job.id,
                        attempt,
                        e
                    );
                    tokio::time::sleep(TERMINAL_WRITE_DELAY).await;
                }
                Err(e) => {
                    // The scrape work itself is durable (idempotent upserts);
                    // the stall sweep will requeue the row and a redone
                    // attempt converges on the same result
                    log_error!("Giving up marking job {} completed: {}", job.id, e);
                }
            }
        }
    }

    async fn finish_failure(&self, job: &ScrapeJob, error: AppError) {
        let retryable = error.is_retryable();
        let message = error.to_string();
        for attempt in 1..=TERMINAL_WRITE_ATTEMPTS {
            match self
                .queue
                .fail_or_retry(job.id, &message, retryable)
                .await
            {
                Ok(RetryDisposition::Requeued { run_at }) => {
                    log_warn!(
                        "Job {} attempt {} failed, retrying at {}: {}",
                        job.id,
                        job.attempts,
                        run_at,
                        message
                    );
                    return;
                }
                Ok(RetryDisposition::Failed) => {
                    log_warn!("Job {} failed terminally: {}", job.id, message);
                    self.publisher
                        .publish(&JobEvent::JobFailed {
                            job_id: job.id,
                            error: message.clone(),
                        })
                        .await;
                    return;
                }
                Err(e) if attempt < TERMINAL_WRITE_ATTEMPTS => {
                    log_warn!(
                        "Failed to record failure of job {} (attempt {}): {}",
                        job.id,
                        attempt,
                        e
                    );
                    tokio::time::sleep(TERMINAL_WRITE_DELAY).await;
                }
                Err(e) => {
                    // Recovery falls to the stall sweep
                    log_error!("Giving up recording failure of job {}: {}", job.id, e);
                }
            }
        }
    }
}

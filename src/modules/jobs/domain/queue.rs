/// Durable queue and job-store contract.
///
/// One backing table serves both concerns: rows are the authoritative job
/// records, and pending rows whose `run_at` has passed form the claimable
/// queue. The claim operation guarantees at-most-one active worker per job.
use crate::modules::jobs::domain::job::{JobSpec, JobStats, ScrapeJob};
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// What `fail_or_retry` decided for a failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDisposition {
    /// Attempt budget remains; job went back to pending, claimable at `run_at`
    Requeued { run_at: DateTime<Utc> },
    /// Budget exhausted or error non-retryable; job is terminally failed
    Failed,
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Persist a new pending job and return the created record
    async fn enqueue(&self, spec: &JobSpec) -> AppResult<ScrapeJob>;

    /// Atomically claim the highest-priority due pending job, moving it to
    /// processing with progress 0 and the attempt counter bumped. Returns
    /// None when nothing is claimable.
    async fn claim(&self) -> AppResult<Option<ScrapeJob>>;

    /// Record a progress checkpoint for a processing job
    async fn update_progress(&self, id: Uuid, progress: i32) -> AppResult<()>;

    /// Terminal success: status completed, progress 100, result stored
    async fn complete(&self, id: Uuid, result: serde_json::Value) -> AppResult<()>;

    /// Record a failed attempt. Requeues with backoff while the attempt
    /// budget and retryability allow, otherwise fails the job terminally
    /// with `error` as the recorded cause. Progress is left where it was.
    async fn fail_or_retry(
        &self,
        id: Uuid,
        error: &str,
        retryable: bool,
    ) -> AppResult<RetryDisposition>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<ScrapeJob>>;

    /// Most recently updated jobs first
    async fn list_recent(&self, limit: i64) -> AppResult<Vec<ScrapeJob>>;

    async fn statistics(&self) -> AppResult<JobStats>;

    /// Recover jobs stuck in processing, e.g. after a worker died mid-attempt
    /// or a terminal write never landed. Rows whose attempt started more than
    /// `stalled_after` ago go back to pending and become claimable at once,
    /// or move to failed when the attempt budget is already spent. Returns
    /// the number of rows touched.
    async fn reclaim_stalled(&self, stalled_after: Duration) -> AppResult<usize>;

    /// Delete terminal jobs untouched for longer than `older_than`; returns
    /// the number removed
    async fn purge_terminal(&self, older_than: Duration) -> AppResult<usize>;
}

/// Diesel-based implementation of JobQueue over the scrape_jobs table.
///
/// Claiming uses `FOR UPDATE SKIP LOCKED` inside a transaction so concurrent
/// workers never pick up the same row. Retry backoff is expressed through the
/// `run_at` column: a requeued job stays pending but invisible to `claim`
/// until its delay has elapsed.
use crate::modules::jobs::domain::{
    JobQueue, JobSpec, JobStats, ScrapeJob, RetryDisposition,
};
use crate::modules::jobs::infrastructure::models::{JobModel, JobStatusDb, NewJob};
use crate::schema::scrape_jobs;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::{DbPool, RetryPolicy};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use tokio::task;
use uuid::Uuid;

pub struct PgJobQueue {
    pool: DbPool,
    retry_policy: RetryPolicy,
}

impl PgJobQueue {
    pub fn new(pool: DbPool, retry_policy: RetryPolicy) -> Self {
        Self { pool, retry_policy }
    }

    fn claim_blocking(conn: &mut PgConnection) -> AppResult<Option<JobModel>> {
        conn.transaction::<Option<JobModel>, AppError, _>(|conn| {
            let now = Utc::now();
            let candidate = scrape_jobs::table
                .filter(scrape_jobs::status.eq(JobStatusDb::Pending))
                .filter(scrape_jobs::run_at.le(now))
                .order((scrape_jobs::priority.asc(), scrape_jobs::created_at.asc()))
                .for_update()
                .skip_locked()
                .first::<JobModel>(conn)
                .optional()
                .map_err(|e| AppError::Persistence(format!("Failed to poll queue: {}", e)))?;

            let Some(candidate) = candidate else {
                return Ok(None);
            };

            let claimed = diesel::update(scrape_jobs::table.find(candidate.id))
                .set((
                    scrape_jobs::status.eq(JobStatusDb::Processing),
                    scrape_jobs::progress.eq(0),
                    scrape_jobs::attempts.eq(candidate.attempts + 1),
                    scrape_jobs::started_at.eq(now),
                    scrape_jobs::updated_at.eq(now),
                ))
                .get_result::<JobModel>(conn)
                .map_err(|e| AppError::Persistence(format!("Failed to claim job: {}", e)))?;

            Ok(Some(claimed))
        })
    }

    fn count_status(conn: &mut PgConnection, status: JobStatusDb) -> AppResult<i64> {
        scrape_jobs::table
            .filter(scrape_jobs::status.eq(status))
            .count()
            .get_result(conn)
            .map_err(|e| AppError::Persistence(format!("Failed to count jobs: {}", e)))
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn enqueue(&self, spec: &JobSpec) -> AppResult<ScrapeJob> {
        let pool = self.pool.clone();
        let new_job = NewJob::from_spec(spec, self.retry_policy.max_attempts)?;

        let model = task::spawn_blocking(move || -> AppResult<JobModel> {
            let mut conn = pool.get()?;
            diesel::insert_into(scrape_jobs::table)
                .values(&new_job)
                .get_result::<JobModel>(&mut conn)
                .map_err(|e| AppError::Persistence(format!("Failed to enqueue job: {}", e)))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))??;

        model.to_job()
    }

    async fn claim(&self) -> AppResult<Option<ScrapeJob>> {
        let pool = self.pool.clone();

        let model = task::spawn_blocking(move || -> AppResult<Option<JobModel>> {
            let mut conn = pool.get()?;
            Self::claim_blocking(&mut conn)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))??;

        model.map(JobModel::to_job).transpose()
    }

    async fn update_progress(&self, id: Uuid, progress: i32) -> AppResult<()> {
        let pool = self.pool.clone();
        let progress = progress.clamp(0, 100);

        task::spawn_blocking(move || -> AppResult<()> {
            let mut conn = pool.get()?;
            diesel::update(scrape_jobs::table.find(id))
                .filter(scrape_jobs::status.eq(JobStatusDb::Processing))
                .set((
                    scrape_jobs::progress.eq(progress),
                    scrape_jobs::updated_at.eq(Utc::now()),
                ))
                .execute(&mut conn)
                .map_err(|e| AppError::Persistence(format!("Failed to update progress: {}", e)))?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))?
    }

    async fn complete(&self, id: Uuid, result: serde_json::Value) -> AppResult<()> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> AppResult<()> {
            let mut conn = pool.get()?;
            let now = Utc::now();
            diesel::update(scrape_jobs::table.find(id))
                .set((
                    scrape_jobs::status.eq(JobStatusDb::Completed),
                    scrape_jobs::progress.eq(100),
                    scrape_jobs::result.eq(Some(result)),
                    scrape_jobs::error.eq(None::<String>),
                    scrape_jobs::completed_at.eq(Some(now)),
                    scrape_jobs::updated_at.eq(now),
                ))
                .execute(&mut conn)
                .map_err(|e| AppError::Persistence(format!("Failed to complete job: {}", e)))?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))?
    }

    async fn fail_or_retry(
        &self,
        id: Uuid,
        error: &str,
        retryable: bool,
    ) -> AppResult<RetryDisposition> {
        let pool = self.pool.clone();
        let policy = self.retry_policy.clone();
        let error = error.to_string();

        task::spawn_blocking(move || -> AppResult<RetryDisposition> {
            let mut conn = pool.get()?;
            conn.transaction::<RetryDisposition, AppError, _>(|conn| {
                let job = scrape_jobs::table
                    .find(id)
                    .for_update()
                    .first::<JobModel>(conn)
                    .map_err(|e| {
                        AppError::Persistence(format!("Failed to load job {}: {}", id, e))
                    })?;

                let now = Utc::now();
                let attempts = job.attempts.max(0) as u32;
                let exhausted = attempts >= job.max_attempts.max(0) as u32;

                if retryable && !exhausted {
                    let run_at: DateTime<Utc> = now
                        + Duration::from_std(policy.delay_for_attempt(attempts))
                            .unwrap_or_else(|_| Duration::seconds(0));
                    diesel::update(scrape_jobs::table.find(id))
                        .set((
                            scrape_jobs::status.eq(JobStatusDb::Pending),
                            scrape_jobs::run_at.eq(run_at),
                            scrape_jobs::error.eq(Some(&error)),
                            scrape_jobs::updated_at.eq(now),
                        ))
                        .execute(conn)
                        .map_err(|e| {
                            AppError::Persistence(format!("Failed to requeue job: {}", e))
                        })?;
                    Ok(RetryDisposition::Requeued { run_at })
                } else {
                    diesel::update(scrape_jobs::table.find(id))
                        .set((
                            scrape_jobs::status.eq(JobStatusDb::Failed),
                            scrape_jobs::error.eq(Some(&error)),
                            scrape_jobs::completed_at.eq(Some(now)),
                            scrape_jobs::updated_at.eq(now),
                        ))
                        .execute(conn)
                        .map_err(|e| {
                            AppError::Persistence(format!("Failed to fail job: {}", e))
                        })?;
                    Ok(RetryDisposition::Failed)
                }
            })
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))?
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<ScrapeJob>> {
        let pool = self.pool.clone();

        let model = task::spawn_blocking(move || -> AppResult<Option<JobModel>> {
            let mut conn = pool.get()?;
            scrape_jobs::table
                .find(id)
                .first::<JobModel>(&mut conn)
                .optional()
                .map_err(|e| AppError::Persistence(format!("Failed to get job: {}", e)))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))??;

        model.map(JobModel::to_job).transpose()
    }

    async fn list_recent(&self, limit: i64) -> AppResult<Vec<ScrapeJob>> {
        let pool = self.pool.clone();

        let models = task::spawn_blocking(move || -> AppResult<Vec<JobModel>> {
            let mut conn = pool.get()?;
            scrape_jobs::table
                .order(scrape_jobs::updated_at.desc())
                .limit(limit.clamp(1, 500))
                .load::<JobModel>(&mut conn)
                .map_err(|e| AppError::Persistence(format!("Failed to list jobs: {}", e)))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))??;

        models.into_iter().map(JobModel::to_job).collect()
    }

    async fn statistics(&self) -> AppResult<JobStats> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> AppResult<JobStats> {
            let mut conn = pool.get()?;
            Ok(JobStats {
                pending: Self::count_status(&mut conn, JobStatusDb::Pending)?,
                processing: Self::count_status(&mut conn, JobStatusDb::Processing)?,
                completed: Self::count_status(&mut conn, JobStatusDb::Completed)?,
                failed: Self::count_status(&mut conn, JobStatusDb::Failed)?,
            })
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))?
    }

    async fn reclaim_stalled(&self, stalled_after: Duration) -> AppResult<usize> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> AppResult<usize> {
            let mut conn = pool.get()?;
            let now = Utc::now();
            let cutoff = now - stalled_after;
            conn.transaction::<usize, AppError, _>(|conn| {
                // Budget spent: there is no attempt left to hand the row to
                let failed = diesel::update(
                    scrape_jobs::table
                        .filter(scrape_jobs::status.eq(JobStatusDb::Processing))
                        .filter(scrape_jobs::started_at.lt(cutoff))
                        .filter(scrape_jobs::attempts.ge(scrape_jobs::max_attempts)),
                )
                .set((
                    scrape_jobs::status.eq(JobStatusDb::Failed),
                    scrape_jobs::error.eq(Some("Worker stalled with no attempt budget left")),
                    scrape_jobs::completed_at.eq(Some(now)),
                    scrape_jobs::updated_at.eq(now),
                ))
                .execute(conn)
                .map_err(|e| {
                    AppError::Persistence(format!("Failed to fail stalled jobs: {}", e))
                })?;

                let requeued = diesel::update(
                    scrape_jobs::table
                        .filter(scrape_jobs::status.eq(JobStatusDb::Processing))
                        .filter(scrape_jobs::started_at.lt(cutoff)),
                )
                .set((
                    scrape_jobs::status.eq(JobStatusDb::Pending),
                    scrape_jobs::run_at.eq(now),
                    scrape_jobs::updated_at.eq(now),
                ))
                .execute(conn)
                .map_err(|e| {
                    AppError::Persistence(format!("Failed to requeue stalled jobs: {}", e))
                })?;

                Ok(failed + requeued)
            })
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))?
    }

    async fn purge_terminal(&self, older_than: Duration) -> AppResult<usize> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> AppResult<usize> {
            let mut conn = pool.get()?;
            let cutoff = Utc::now() - older_than;
            diesel::delete(
                scrape_jobs::table
                    .filter(
                        scrape_jobs::status
                            .eq(JobStatusDb::Completed)
                            .or(scrape_jobs::status.eq(JobStatusDb::Failed)),
                    )
                    .filter(scrape_jobs::updated_at.lt(cutoff)),
            )
            .execute(&mut conn)
            .map_err(|e| AppError::Persistence(format!("Failed to purge jobs: {}", e)))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task panicked: {}", e)))?
    }
}

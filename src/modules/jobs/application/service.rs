/// Job submission and monitoring surface.
///
/// Submissions are validated here, before anything reaches the queue: a
/// malformed request is rejected with a validation error and never retried.
use crate::log_info;
use crate::modules::jobs::domain::{JobQueue, JobSpec, JobStats, ScrapeJob, ScrapeTarget};
use crate::modules::notify::{JobEvent, ProgressPublisher};
use crate::modules::scraper::SourceKind;
use crate::shared::errors::{AppError, AppResult};
use chrono::Duration;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// An incoming job request, as the external submission layer sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JobSubmission {
    Title {
        target_url: String,
        #[serde(default)]
        target_slug: Option<String>,
        #[serde(default)]
        source: Option<SourceKind>,
    },
    Episode {
        target_url: String,
        #[serde(default)]
        target_slug: Option<String>,
        #[serde(default)]
        source: Option<SourceKind>,
        parent_id: Uuid,
    },
    Batch {
        items: Vec<JobSubmission>,
    },
}

/// Last non-empty path segment of the URL, the conventional slug position on
/// both supported sources.
fn derive_slug(url: &reqwest::Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

fn resolve_target(
    target_url: &str,
    target_slug: Option<String>,
) -> AppResult<(ScrapeTarget, Option<SourceKind>)> {
    let parsed = reqwest::Url::parse(target_url)
        .map_err(|e| AppError::Validation(format!("Malformed target URL '{}': {}", target_url, e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::Validation(format!(
            "Unsupported URL scheme '{}'",
            parsed.scheme()
        )));
    }

    let slug = match target_slug {
        Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
        _ => derive_slug(&parsed).ok_or_else(|| {
            AppError::Validation(format!("Cannot derive a slug from '{}'", target_url))
        })?,
    };

    let inferred = SourceKind::from_url(target_url);
    Ok((
        ScrapeTarget {
            url: target_url.to_string(),
            slug,
        },
        inferred,
    ))
}

fn build_spec(submission: JobSubmission, depth: usize) -> AppResult<JobSpec> {
    match submission {
        JobSubmission::Title {
            target_url,
            target_slug,
            source,
        } => {
            let (target, inferred) = resolve_target(&target_url, target_slug)?;
            Ok(JobSpec::Title {
                target,
                source_hint: source.or(inferred),
            })
        }
        JobSubmission::Episode {
            target_url,
            target_slug,
            source,
            parent_id,
        } => {
            let (target, inferred) = resolve_target(&target_url, target_slug)?;
            Ok(JobSpec::Episode {
                target,
                source_hint: source.or(inferred),
                parent_id,
            })
        }
        JobSubmission::Batch { items } => {
            if depth > 0 {
                return Err(AppError::Validation(
                    "Batch jobs cannot contain nested batches".to_string(),
                ));
            }
            if items.is_empty() {
                return Err(AppError::Validation(
                    "Batch job must contain at least one item".to_string(),
                ));
            }
            let items = items
                .into_iter()
                .map(|item| build_spec(item, depth + 1))
                .collect::<AppResult<Vec<_>>>()?;
            Ok(JobSpec::Batch { items })
        }
    }
}

pub struct JobService {
    queue: Arc<dyn JobQueue>,
    publisher: Arc<dyn ProgressPublisher>,
}

impl JobService {
    pub fn new(queue: Arc<dyn JobQueue>, publisher: Arc<dyn ProgressPublisher>) -> Self {
        Self { queue, publisher }
    }

    /// Validate a submission and enqueue it. Returns the created job with
    /// its caller-visible id and initial pending status.
    pub async fn submit(&self, submission: JobSubmission) -> AppResult<ScrapeJob> {
        let spec = build_spec(submission, 0)?;
        let job = self.queue.enqueue(&spec).await?;
        log_info!("Submitted {} job {}", spec.kind_name(), job.id);
        self.publisher
            .publish(&JobEvent::JobCreated { job_id: job.id })
            .await;
        Ok(job)
    }

    pub async fn get_job(&self, id: Uuid) -> AppResult<Option<ScrapeJob>> {
        self.queue.get_by_id(id).await
    }

    pub async fn list_recent(&self, limit: i64) -> AppResult<Vec<ScrapeJob>> {
        self.queue.list_recent(limit).await
    }

    pub async fn statistics(&self) -> AppResult<JobStats> {
        self.queue.statistics().await
    }

    /// Housekeeping: drop terminal jobs older than the retention window
    pub async fn purge_terminal(&self, older_than: Duration) -> AppResult<usize> {
        let purged = self.queue.purge_terminal(older_than).await?;
        if purged > 0 {
            log_info!("Purged {} terminal jobs", purged);
        }
        Ok(purged)
    }
}

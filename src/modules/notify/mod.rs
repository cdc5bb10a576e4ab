/// Best-effort progress notifications.
///
/// The pipeline calls `publish` synchronously right after the corresponding
/// job-store write, so every published event reflects already-durable state.
/// Publishers are fire-and-forget: failures are logged and swallowed, never
/// retried, and never fail the job.
use crate::shared::errors::AppError;
use crate::{log_debug, log_info, log_warn};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::jobs::domain::JobStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum JobEvent {
    JobCreated {
        job_id: Uuid,
    },
    JobUpdated {
        job_id: Uuid,
        status: JobStatus,
        progress: i32,
    },
    JobCompleted {
        job_id: Uuid,
        result: serde_json::Value,
    },
    JobFailed {
        job_id: Uuid,
        error: String,
    },
}

impl JobEvent {
    pub fn job_id(&self) -> Uuid {
        match self {
            JobEvent::JobCreated { job_id }
            | JobEvent::JobUpdated { job_id, .. }
            | JobEvent::JobCompleted { job_id, .. }
            | JobEvent::JobFailed { job_id, .. } => *job_id,
        }
    }
}

#[async_trait]
pub trait ProgressPublisher: Send + Sync {
    /// Publish one event. Must not return an error: implementations handle
    /// their own failures internally.
    async fn publish(&self, event: &JobEvent);
}

/// Publisher that only writes to the log. The default when no external
/// channel is configured.
pub struct LogPublisher;

#[async_trait]
impl ProgressPublisher for LogPublisher {
    async fn publish(&self, event: &JobEvent) {
        match event {
            JobEvent::JobCreated { job_id } => log_info!("Job {} created", job_id),
            JobEvent::JobUpdated {
                job_id,
                status,
                progress,
            } => log_debug!("Job {} {} at {}%", job_id, status, progress),
            JobEvent::JobCompleted { job_id, .. } => log_info!("Job {} completed", job_id),
            JobEvent::JobFailed { job_id, error } => {
                log_warn!("Job {} failed: {}", job_id, error)
            }
        }
    }
}

/// Publisher that POSTs the event envelope to an external real-time channel
/// endpoint.
pub struct WebhookPublisher {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookPublisher {
    pub fn new(endpoint: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .user_agent("AtsumeScraper/1.0")
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl ProgressPublisher for WebhookPublisher {
    async fn publish(&self, event: &JobEvent) {
        let result = self.client.post(&self.endpoint).json(event).send().await;
        match result {
            Ok(response) if !response.status().is_success() => {
                log_warn!(
                    "Progress webhook returned HTTP {} for job {}",
                    response.status(),
                    event.job_id()
                );
            }
            Err(e) => {
                log_warn!(
                    "Progress webhook failed for job {}: {}",
                    event.job_id(),
                    e
                );
            }
            Ok(_) => {}
        }
    }
}

use crate::modules::scraper::SourceKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a scrape job. Terminal states are never left in the normal
/// path; a retried job goes back to `Pending` before its attempt budget runs
/// out, never out of `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// What a job scrapes: the source page URL plus the normalized slug used as
/// the natural key for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeTarget {
    pub url: String,
    pub slug: String,
}

/// The work a job carries, as a tagged sum type.
///
/// Each variant owns exactly the fields its handler needs, so a malformed
/// combination (an episode job without a parent, say) cannot be represented
/// once it passes submission validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JobSpec {
    Title {
        target: ScrapeTarget,
        source_hint: Option<SourceKind>,
    },
    Episode {
        target: ScrapeTarget,
        source_hint: Option<SourceKind>,
        parent_id: Uuid,
    },
    Batch {
        items: Vec<JobSpec>,
    },
}

impl JobSpec {
    /// Queue priority: title jobs are serviced before everything else.
    pub fn priority(&self) -> i32 {
        match self {
            JobSpec::Title { .. } => 1,
            JobSpec::Episode { .. } | JobSpec::Batch { .. } => 2,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            JobSpec::Title { .. } => "title",
            JobSpec::Episode { .. } => "episode",
            JobSpec::Batch { .. } => "batch",
        }
    }
}

/// A job as stored in the queue. The store owns the authoritative status,
/// progress, result and error fields; workers are the only mutators after
/// submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeJob {
    pub id: Uuid,
    pub spec: JobSpec,
    pub priority: i32,
    pub status: JobStatus,
    pub progress: i32,
    /// Attempts already started, including the current one while processing
    pub attempts: i32,
    pub max_attempts: i32,
    /// Earliest claimable instant; pushed into the future by retry backoff
    pub run_at: DateTime<Utc>,
    pub error: Option<String>,
    pub result: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Counts per status, for the monitoring surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
}

impl JobStats {
    pub fn total(&self) -> i64 {
        self.pending + self.processing + self.completed + self.failed
    }
}

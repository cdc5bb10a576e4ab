/// Diesel models for the scrape_jobs table
use crate::modules::jobs::domain::{JobSpec, JobStatus, ScrapeJob};
use crate::schema::scrape_jobs;
use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(diesel_derive_enum::DbEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[ExistingTypePath = "crate::schema::sql_types::JobStatus"]
pub enum JobStatusDb {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl From<JobStatus> for JobStatusDb {
    fn from(value: JobStatus) -> Self {
        match value {
            JobStatus::Pending => JobStatusDb::Pending,
            JobStatus::Processing => JobStatusDb::Processing,
            JobStatus::Completed => JobStatusDb::Completed,
            JobStatus::Failed => JobStatusDb::Failed,
        }
    }
}

impl From<JobStatusDb> for JobStatus {
    fn from(value: JobStatusDb) -> Self {
        match value {
            JobStatusDb::Pending => JobStatus::Pending,
            JobStatusDb::Processing => JobStatus::Processing,
            JobStatusDb::Completed => JobStatus::Completed,
            JobStatusDb::Failed => JobStatus::Failed,
        }
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = scrape_jobs)]
pub struct JobModel {
    pub id: Uuid,
    pub payload: JsonValue,
    pub priority: i32,
    pub status: JobStatusDb,
    pub progress: i32,
    pub attempts: i32,
    pub max_attempts: i32,
    pub run_at: DateTime<Utc>,
    pub error: Option<String>,
    pub result: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobModel {
    /// A payload that no longer deserializes means the row predates a spec
    /// format change; surfaced as a persistence error rather than a panic.
    pub fn to_job(self) -> AppResult<ScrapeJob> {
        let spec: JobSpec = serde_json::from_value(self.payload).map_err(|e| {
            AppError::Persistence(format!("Undecodable job payload for {}: {}", self.id, e))
        })?;
        Ok(ScrapeJob {
            id: self.id,
            spec,
            priority: self.priority,
            status: self.status.into(),
            progress: self.progress,
            attempts: self.attempts,
            max_attempts: self.max_attempts,
            run_at: self.run_at,
            error: self.error,
            result: self.result,
            created_at: self.created_at,
            updated_at: self.updated_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
        })
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = scrape_jobs)]
pub struct NewJob {
    pub payload: JsonValue,
    pub priority: i32,
    pub status: JobStatusDb,
    pub max_attempts: i32,
}

impl NewJob {
    pub fn from_spec(spec: &JobSpec, max_attempts: u32) -> AppResult<Self> {
        Ok(Self {
            payload: serde_json::to_value(spec)?,
            priority: spec.priority(),
            status: JobStatusDb::Pending,
            max_attempts: max_attempts as i32,
        })
    }
}

use serde::Serialize;
use thiserror::Error;

/// Error taxonomy for the scrape pipeline.
///
/// The variants map directly onto scheduling decisions: `NotFound` triggers
/// source fallback, `Transient`/`Persistence`/`RateLimited` are retried with
/// backoff, `Validation` is rejected before a job ever reaches the queue, and
/// `ExhaustedSources` is terminal.
#[derive(Error, Debug, Clone, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transient error: {0}")]
    Transient(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("No source produced data: {0}")]
    ExhaustedSources(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the queue should re-run the job (with backoff) after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Transient(_)
                | AppError::Persistence(_)
                | AppError::RateLimited(_)
                | AppError::Internal(_)
        )
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => {
                AppError::NotFound("Record not found in database".to_string())
            }
            _ => AppError::Persistence(err.to_string()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for AppError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        AppError::Persistence(format!("Database pool error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Transient("Request timeout".to_string())
        } else if err.is_connect() {
            AppError::Transient("Failed to connect to external service".to_string())
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                429 => AppError::RateLimited("Too many requests".to_string()),
                404 => AppError::NotFound("External resource not found".to_string()),
                _ => AppError::Transient(format!("HTTP {}: {}", status, err)),
            }
        } else {
            AppError::Transient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("Serialization error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(format!("Invalid UUID: {}", err))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::Validation(format!("Invalid number: {}", err))
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

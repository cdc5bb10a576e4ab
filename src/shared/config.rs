use crate::shared::errors::{AppError, AppResult};
use std::env;
use std::time::Duration;

/// Daemon configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Number of concurrent workers pulling from the queue
    pub worker_concurrency: usize,
    /// Hard bound on one job attempt; expiry is treated as a transient failure
    pub attempt_timeout: Duration,
    /// How long an idle worker sleeps before polling the queue again
    pub poll_interval: Duration,
    pub otakudesu_base_url: String,
    pub anoboy_base_url: String,
    pub jikan_base_url: String,
    /// Optional endpoint for the webhook progress publisher
    pub webhook_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        let database_url = env::var("DATABASE_URL").map_err(|_| {
            AppError::Validation("DATABASE_URL environment variable not found".to_string())
        })?;

        let worker_concurrency = env::var("ATSUME_WORKER_CONCURRENCY")
            .ok()
            .map(|v| v.parse::<usize>())
            .transpose()?
            .unwrap_or(3);
        if worker_concurrency == 0 {
            return Err(AppError::Validation(
                "ATSUME_WORKER_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        let attempt_timeout_secs = env::var("ATSUME_ATTEMPT_TIMEOUT_SECS")
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()?
            .unwrap_or(600);

        Ok(Self {
            database_url,
            worker_concurrency,
            attempt_timeout: Duration::from_secs(attempt_timeout_secs),
            poll_interval: Duration::from_secs(5),
            otakudesu_base_url: env::var("OTAKUDESU_BASE_URL")
                .unwrap_or_else(|_| "https://otakudesu.best".to_string()),
            anoboy_base_url: env::var("ANOBOY_BASE_URL")
                .unwrap_or_else(|_| "https://ww3.anoboy.app".to_string()),
            jikan_base_url: env::var("JIKAN_BASE_URL")
                .unwrap_or_else(|_| "https://api.jikan.moe/v4".to_string()),
            webhook_url: env::var("ATSUME_WEBHOOK_URL").ok(),
        })
    }
}

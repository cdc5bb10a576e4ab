use crate::shared::errors::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use std::time::Duration;

const USER_AGENT: &str = "AtsumeScraper/1.0 (+https://github.com/atsume)";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP page fetcher for the source adapters.
///
/// One client per adapter, 30 second bound per call, declared user agent.
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new() -> AppResult<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Fetch a page body. A 404 is `NotFound`; network failures, timeouts and
    /// server errors are `Transient`.
    pub async fn fetch(&self, url: &str) -> AppResult<String> {
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                Err(AppError::NotFound(format!("Page not found: {}", url)))
            }
            status if status.is_success() => Ok(response.text().await?),
            status => Err(AppError::Transient(format!(
                "HTTP {} fetching {}",
                status, url
            ))),
        }
    }
}

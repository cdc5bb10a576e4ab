use crate::modules::enrichment::jikan::dto::JikanSearchResponse;
use crate::modules::enrichment::EnrichmentData;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::RateLimiter;
use reqwest::{Client, StatusCode};

/// Client for the Jikan v4 metadata API.
///
/// The API demands 1 second of spacing between calls; the rate limiter
/// enforces that before every request.
pub struct JikanClient {
    client: Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl JikanClient {
    pub fn new(base_url: String) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("AtsumeScraper/1.0")
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            rate_limiter: RateLimiter::new(1.0),
        })
    }

    pub async fn search_anime(
        &self,
        query: &str,
        limit: usize,
    ) -> AppResult<Vec<EnrichmentData>> {
        if query.trim().is_empty() {
            return Err(AppError::Validation(
                "Search query cannot be empty".to_string(),
            ));
        }

        self.rate_limiter.wait().await;

        let url = format!("{}/anime", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query.trim()),
                ("limit", &limit.min(25).to_string()),
                ("order_by", "score"),
                ("sort", "desc"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Transient(format!("Jikan search failed: {}", e)))?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(AppError::RateLimited("Jikan rate limit hit".to_string()))
            }
            status if !status.is_success() => {
                return Err(AppError::Transient(format!(
                    "Jikan returned HTTP {}",
                    status
                )))
            }
            _ => {}
        }

        let parsed = response
            .json::<JikanSearchResponse>()
            .await
            .map_err(|e| AppError::Transient(format!("Failed to parse Jikan response: {}", e)))?;

        Ok(parsed
            .data
            .into_iter()
            .map(|anime| anime.into_enrichment())
            .collect())
    }
}

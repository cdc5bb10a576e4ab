pub mod jikan;
pub mod matching;
pub mod merge;

use crate::modules::catalog::domain::{AnimeStatus, AnimeType};
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use jikan::JikanClient;
pub use matching::{calculate_similarity, normalize_title, select_best_match};
pub use merge::merge_title;

/// Non-authoritative metadata for a title, used only to fill gaps in a
/// scraped partial.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentData {
    pub mal_id: i32,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    pub title_synonyms: Vec<String>,
    pub synopsis: Option<String>,
    pub score: Option<f32>,
    pub anime_type: Option<AnimeType>,
    pub status: Option<AnimeStatus>,
    pub episodes: Option<i32>,
    pub duration: Option<String>,
    pub release_date: Option<String>,
    pub studio: Option<String>,
    pub genres: Vec<String>,
}

impl EnrichmentData {
    /// Every title string this candidate is known by.
    pub fn all_titles(&self) -> Vec<&str> {
        let mut titles = vec![self.title.as_str()];
        if let Some(english) = &self.title_english {
            titles.push(english);
        }
        if let Some(japanese) = &self.title_japanese {
            titles.push(japanese);
        }
        titles.extend(self.title_synonyms.iter().map(String::as_str));
        titles
    }
}

/// Metadata lookup by free-text title.
///
/// Best-effort: a `None` means no usable candidate; errors are degraded to
/// "no enrichment" by the caller, never into job failure.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn lookup(&self, title: &str) -> AppResult<Option<EnrichmentData>>;
}

/// Enricher backed by the Jikan search API with fuzzy candidate selection.
pub struct JikanEnricher {
    client: JikanClient,
}

impl JikanEnricher {
    const SEARCH_LIMIT: usize = 5;

    pub fn new(client: JikanClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Enricher for JikanEnricher {
    async fn lookup(&self, title: &str) -> AppResult<Option<EnrichmentData>> {
        let candidates = self.client.search_anime(title, Self::SEARCH_LIMIT).await?;
        Ok(select_best_match(title, &candidates).cloned())
    }
}

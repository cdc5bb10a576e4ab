use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a title, matching the `anime_status` database type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimeStatus {
    Ongoing,
    Completed,
    Upcoming,
}

impl AnimeStatus {
    /// Lenient mapping from the free-text status strings the sources emit.
    ///
    /// Covers both scraped labels ("Ongoing") and enrichment labels
    /// ("Currently Airing"). Unknown strings map to None, not an error.
    pub fn from_source(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "ongoing" | "currently airing" | "airing" => Some(AnimeStatus::Ongoing),
            "completed" | "finished airing" | "finished" => Some(AnimeStatus::Completed),
            "upcoming" | "not yet aired" => Some(AnimeStatus::Upcoming),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnimeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnimeStatus::Ongoing => write!(f, "ongoing"),
            AnimeStatus::Completed => write!(f, "completed"),
            AnimeStatus::Upcoming => write!(f, "upcoming"),
        }
    }
}

/// Categorical type of a title, matching the `anime_type` database type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimeType {
    Tv,
    Movie,
    Ova,
    Ona,
    Special,
}

impl AnimeType {
    pub fn from_source(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "tv" => Some(AnimeType::Tv),
            "movie" => Some(AnimeType::Movie),
            "ova" => Some(AnimeType::Ova),
            "ona" => Some(AnimeType::Ona),
            "special" => Some(AnimeType::Special),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnimeType::Tv => write!(f, "tv"),
            AnimeType::Movie => write!(f, "movie"),
            AnimeType::Ova => write!(f, "ova"),
            AnimeType::Ona => write!(f, "ona"),
            AnimeType::Special => write!(f, "special"),
        }
    }
}

/// Persisted title record. Uniquely addressed by `slug`; re-scraping the same
/// slug updates this record in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeRecord {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub japanese_title: Option<String>,
    pub synopsis: Option<String>,
    pub rating: Option<f32>,
    pub anime_type: Option<AnimeType>,
    pub status: Option<AnimeStatus>,
    pub episode_count: Option<i32>,
    pub duration: Option<String>,
    pub release_date: Option<String>,
    pub studio: Option<String>,
    pub genres: Vec<String>,
    pub mal_id: Option<i32>,
    pub otakudesu_url: Option<String>,
    pub anoboy_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scrape result for a title. Every field beyond identity is optional;
/// sources are unreliable and parse degradation is expected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimePartial {
    pub slug: String,
    pub title: String,
    pub japanese_title: Option<String>,
    pub synopsis: Option<String>,
    pub rating: Option<f32>,
    pub anime_type: Option<AnimeType>,
    pub status: Option<AnimeStatus>,
    pub episode_count: Option<i32>,
    pub duration: Option<String>,
    pub release_date: Option<String>,
    pub studio: Option<String>,
    pub genres: Vec<String>,
    pub mal_id: Option<i32>,
    pub otakudesu_url: Option<String>,
    pub anoboy_url: Option<String>,
}

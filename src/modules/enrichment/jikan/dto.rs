/// Wire types for the Jikan v4 REST API.
use crate::modules::catalog::domain::{AnimeStatus, AnimeType};
use crate::modules::enrichment::EnrichmentData;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JikanSearchResponse {
    #[serde(default)]
    pub data: Vec<JikanAnime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JikanAnime {
    pub mal_id: i32,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    #[serde(default)]
    pub title_synonyms: Vec<String>,
    #[serde(rename = "type")]
    pub anime_type: Option<String>,
    pub episodes: Option<i32>,
    pub status: Option<String>,
    pub aired: Option<JikanAired>,
    pub duration: Option<String>,
    pub score: Option<f64>,
    pub synopsis: Option<String>,
    #[serde(default)]
    pub studios: Vec<JikanNamedEntry>,
    #[serde(default)]
    pub genres: Vec<JikanNamedEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JikanAired {
    #[serde(rename = "string")]
    pub display: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JikanNamedEntry {
    pub name: String,
}

impl JikanAnime {
    pub fn into_enrichment(self) -> EnrichmentData {
        EnrichmentData {
            mal_id: self.mal_id,
            title: self.title,
            title_english: self.title_english,
            title_japanese: self.title_japanese,
            title_synonyms: self.title_synonyms,
            synopsis: self.synopsis,
            score: self.score.map(|s| s as f32),
            anime_type: self.anime_type.as_deref().and_then(AnimeType::from_source),
            status: self.status.as_deref().and_then(AnimeStatus::from_source),
            episodes: self.episodes,
            duration: self.duration,
            release_date: self.aired.and_then(|a| a.display),
            studio: self.studios.into_iter().next().map(|s| s.name),
            genres: self.genres.into_iter().map(|g| g.name).collect(),
        }
    }
}

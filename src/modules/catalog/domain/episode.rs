use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

fn validate_link(key: &str, url: &str) -> AppResult<()> {
    if key.trim().is_empty() {
        return Err(AppError::Validation("Link key must be non-empty".to_string()));
    }
    reqwest::Url::parse(url)
        .map_err(|e| AppError::Validation(format!("Malformed link URL '{}': {}", url, e)))?;
    Ok(())
}

/// Streaming link map: provider -> URL.
///
/// Keys and values are validated at the adapter boundary; anything stored
/// here is a non-empty provider name mapping to a well-formed URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamingLinks(BTreeMap<String, String>);

impl StreamingLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, provider: &str, url: &str) -> AppResult<()> {
        validate_link(provider, url)?;
        self.0.insert(provider.to_string(), url.to_string());
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, provider: &str) -> Option<&str> {
        self.0.get(provider).map(String::as_str)
    }
}

/// Download link map: quality -> provider -> URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadLinks(BTreeMap<String, BTreeMap<String, String>>);

impl DownloadLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, quality: &str, provider: &str, url: &str) -> AppResult<()> {
        if quality.trim().is_empty() {
            return Err(AppError::Validation(
                "Download quality must be non-empty".to_string(),
            ));
        }
        validate_link(provider, url)?;
        self.0
            .entry(quality.to_string())
            .or_default()
            .insert(provider.to_string(), url.to_string());
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, quality: &str, provider: &str) -> Option<&str> {
        self.0
            .get(quality)
            .and_then(|providers| providers.get(provider))
            .map(String::as_str)
    }
}

/// Persisted episode record, unique per (`anime_id`, `episode_number`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub id: Uuid,
    pub anime_id: Uuid,
    pub episode_number: i32,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub duration: Option<String>,
    pub air_date: Option<String>,
    pub otakudesu_url: Option<String>,
    pub anoboy_url: Option<String>,
    pub download_links: DownloadLinks,
    pub streaming_links: StreamingLinks,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scrape result for a single episode page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpisodePartial {
    pub episode_number: i32,
    pub title: Option<String>,
    pub slug: String,
    pub duration: Option<String>,
    pub air_date: Option<String>,
    pub otakudesu_url: Option<String>,
    pub anoboy_url: Option<String>,
    pub download_links: DownloadLinks,
    pub streaming_links: StreamingLinks,
}

/// One entry of a title's episode listing, before the episode page itself is
/// scraped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStub {
    pub episode_number: i32,
    pub title: Option<String>,
    pub slug: String,
    pub url: String,
}

impl EpisodeStub {
    pub fn to_partial(&self, source_url_field: SourceUrlField) -> EpisodePartial {
        let mut partial = EpisodePartial {
            episode_number: self.episode_number,
            title: self.title.clone(),
            slug: self.slug.clone(),
            ..Default::default()
        };
        match source_url_field {
            SourceUrlField::Otakudesu => partial.otakudesu_url = Some(self.url.clone()),
            SourceUrlField::Anoboy => partial.anoboy_url = Some(self.url.clone()),
        }
        partial
    }
}

/// Which provenance column a stub's URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceUrlField {
    Otakudesu,
    Anoboy,
}

/// Normalize a raw episode listing: drop unparseable numbers (<= 0), collapse
/// duplicate numbers keeping the first occurrence, sort ascending.
pub fn normalize_stubs(raw: Vec<EpisodeStub>) -> Vec<EpisodeStub> {
    let mut seen = std::collections::HashSet::new();
    let mut stubs: Vec<EpisodeStub> = raw
        .into_iter()
        .filter(|stub| stub.episode_number > 0)
        .filter(|stub| seen.insert(stub.episode_number))
        .collect();
    stubs.sort_by_key(|stub| stub.episode_number);
    stubs
}

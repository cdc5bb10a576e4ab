pub mod anoboy;
pub mod otakudesu;
pub mod page;

use crate::modules::catalog::domain::{AnimePartial, EpisodePartial, EpisodeStub};
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use anoboy::AnoboyAdapter;
pub use otakudesu::OtakudesuAdapter;
pub use page::PageFetcher;

/// Identity of a concrete content source.
///
/// The declaration order here is the default fallback order for jobs without
/// a source hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Otakudesu,
    Anoboy,
}

impl SourceKind {
    pub const DEFAULT_ORDER: [SourceKind; 2] = [SourceKind::Otakudesu, SourceKind::Anoboy];

    /// Guess the source from a target URL's host, the way job submissions
    /// without an explicit source are resolved.
    pub fn from_url(url: &str) -> Option<Self> {
        if url.contains("otakudesu") {
            Some(SourceKind::Otakudesu)
        } else if url.contains("anoboy") {
            Some(SourceKind::Anoboy)
        } else {
            None
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Otakudesu => write!(f, "otakudesu"),
            SourceKind::Anoboy => write!(f, "anoboy"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "otakudesu" => Ok(SourceKind::Otakudesu),
            "anoboy" => Ok(SourceKind::Anoboy),
            _ => Err(format!("Unknown source: {}", s)),
        }
    }
}

/// Uniform capability every content source exposes.
///
/// Implementations perform network I/O against exactly one external host with
/// a bounded per-call timeout and must not mutate shared state. Failures are
/// reported through the error taxonomy: `NotFound` means the source has no
/// such content (expected, triggers fallback), `Transient` means the fetch or
/// parse broke (eligible for fallback and retry). Missing optional fields are
/// parse degradation, not an error.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Scrape a title page by slug
    async fn fetch_title(&self, slug: &str) -> AppResult<AnimePartial>;

    /// Derive the full episode listing for a title. Finite and restartable:
    /// a fresh call re-derives the whole list, sorted ascending by episode
    /// number with duplicates collapsed (first occurrence wins).
    async fn fetch_episode_list(&self, title_slug: &str) -> AppResult<Vec<EpisodeStub>>;

    /// Scrape a single episode page by slug
    async fn fetch_episode(&self, episode_slug: &str) -> AppResult<EpisodePartial>;
}

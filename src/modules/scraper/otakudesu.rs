/// Otakudesu source adapter (primary source).
///
/// Page layouts on this host label every info row ("Judul: ...", "Skor: ..."),
/// so extraction keys off row labels rather than element positions.
use crate::modules::catalog::domain::{
    normalize_stubs, AnimePartial, AnimeStatus, AnimeType, EpisodePartial, EpisodeStub,
};
use crate::modules::scraper::page::PageFetcher;
use crate::modules::scraper::{SourceAdapter, SourceKind};
use crate::shared::errors::{AppError, AppResult};
use crate::{log_debug, log_warn};
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};

pub struct OtakudesuAdapter {
    fetcher: PageFetcher,
    base_url: String,
}

fn selector(css: &str) -> AppResult<Selector> {
    Selector::parse(css)
        .map_err(|e| AppError::Internal(format!("Invalid selector '{}': {:?}", css, e)))
}

fn element_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

impl OtakudesuAdapter {
    pub fn new(base_url: String) -> AppResult<Self> {
        Ok(Self {
            fetcher: PageFetcher::new()?,
            base_url,
        })
    }

    fn title_url(&self, slug: &str) -> String {
        format!("{}/anime/{}", self.base_url, slug)
    }

    fn episode_url(&self, slug: &str) -> String {
        format!("{}/episode/{}", self.base_url, slug)
    }

    fn parse_title(html: &str, slug: &str, url: &str) -> AppResult<AnimePartial> {
        let document = Html::parse_document(html);
        let info_rows = selector(".infozin .infozingle p span")?;
        let genre_links = selector("a")?;
        let synopsis_sel = selector(".sinopc")?;

        let mut partial = AnimePartial {
            slug: slug.to_string(),
            otakudesu_url: Some(url.to_string()),
            ..Default::default()
        };

        for row in document.select(&info_rows) {
            let text = element_text(row);
            let Some((label, value)) = text.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match label.trim() {
                "Judul" => partial.title = value.to_string(),
                "Japanese" => partial.japanese_title = Some(value.to_string()),
                "Skor" => partial.rating = value.parse::<f32>().ok(),
                "Tipe" => partial.anime_type = AnimeType::from_source(value),
                "Status" => partial.status = AnimeStatus::from_source(value),
                "Total Episode" => {
                    partial.episode_count =
                        value.chars().filter(char::is_ascii_digit).collect::<String>()
                            .parse::<i32>()
                            .ok()
                }
                "Durasi" => partial.duration = Some(value.to_string()),
                "Tanggal Rilis" => partial.release_date = Some(value.to_string()),
                "Studio" => partial.studio = Some(value.to_string()),
                "Genre" | "Genres" => {
                    partial.genres = row
                        .select(&genre_links)
                        .map(element_text)
                        .filter(|g| !g.is_empty())
                        .collect();
                }
                _ => {}
            }
        }

        if let Some(node) = document.select(&synopsis_sel).next() {
            let synopsis = element_text(node);
            if !synopsis.is_empty() {
                partial.synopsis = Some(synopsis);
            }
        }

        if partial.title.is_empty() {
            return Err(AppError::NotFound(format!(
                "No anime content at {}",
                url
            )));
        }

        Ok(partial)
    }

    fn parse_episode_list(html: &str) -> AppResult<Vec<EpisodeStub>> {
        let document = Html::parse_document(html);
        let links = selector(".episodelist ul li a")?;
        let number_re = Regex::new(r"episode-(\d+)")
            .map_err(|e| AppError::Internal(format!("Invalid regex: {}", e)))?;
        let slug_re = Regex::new(r"/episode/([^/]+)/?$")
            .map_err(|e| AppError::Internal(format!("Invalid regex: {}", e)))?;

        let mut stubs = Vec::new();
        for link in document.select(&links) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let episode_number = number_re
                .captures(href)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<i32>().ok())
                .unwrap_or(0);
            let Some(slug) = slug_re
                .captures(href)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
            else {
                continue;
            };

            let text = element_text(link);
            stubs.push(EpisodeStub {
                episode_number,
                title: if text.is_empty() { None } else { Some(text) },
                slug,
                url: href.to_string(),
            });
        }

        Ok(normalize_stubs(stubs))
    }

    fn parse_episode(html: &str, slug: &str, url: &str) -> AppResult<EpisodePartial> {
        let document = Html::parse_document(html);
        let heading = selector(".venutama h1")?;
        let download_rows = selector(".download ul li")?;
        let quality_sel = selector("strong")?;
        let link_sel = selector("a")?;
        let stream_frames = selector(".responsive-embed-stream iframe")?;
        let number_re = Regex::new(r"[Ee]pisode[\s-]*(\d+)")
            .map_err(|e| AppError::Internal(format!("Invalid regex: {}", e)))?;

        let title = document
            .select(&heading)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let episode_number = number_re
            .captures(&title)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<i32>().ok())
            .unwrap_or(0);

        if episode_number <= 0 {
            return Err(AppError::Transient(format!(
                "Could not determine episode number at {}",
                url
            )));
        }

        let mut partial = EpisodePartial {
            episode_number,
            title: if title.is_empty() { None } else { Some(title) },
            slug: slug.to_string(),
            otakudesu_url: Some(url.to_string()),
            ..Default::default()
        };

        for row in document.select(&download_rows) {
            let Some(quality) = row.select(&quality_sel).next().map(element_text) else {
                continue;
            };
            for link in row.select(&link_sel) {
                let provider = element_text(link);
                let Some(href) = link.value().attr("href") else {
                    continue;
                };
                if let Err(e) = partial.download_links.insert(&quality, &provider, href) {
                    log_debug!("Skipping download link on {}: {}", url, e);
                }
            }
        }

        for frame in document.select(&stream_frames) {
            let Some(src) = frame.value().attr("src") else {
                continue;
            };
            let provider = streaming_provider(src);
            if let Err(e) = partial.streaming_links.insert(provider, src) {
                log_debug!("Skipping streaming link on {}: {}", url, e);
            }
        }

        Ok(partial)
    }
}

fn streaming_provider(src: &str) -> &'static str {
    if src.contains("mp4upload") {
        "mp4upload"
    } else if src.contains("streamtape") {
        "streamtape"
    } else if src.contains("doodstream") {
        "doodstream"
    } else {
        "unknown"
    }
}

#[async_trait]
impl SourceAdapter for OtakudesuAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Otakudesu
    }

    async fn fetch_title(&self, slug: &str) -> AppResult<AnimePartial> {
        let url = self.title_url(slug);
        let html = self.fetcher.fetch(&url).await?;
        Self::parse_title(&html, slug, &url)
    }

    async fn fetch_episode_list(&self, title_slug: &str) -> AppResult<Vec<EpisodeStub>> {
        let url = self.title_url(title_slug);
        let html = self.fetcher.fetch(&url).await?;
        let stubs = Self::parse_episode_list(&html)?;
        if stubs.is_empty() {
            log_warn!("No episodes found for {} on otakudesu", title_slug);
        }
        Ok(stubs)
    }

    async fn fetch_episode(&self, episode_slug: &str) -> AppResult<EpisodePartial> {
        let url = self.episode_url(episode_slug);
        let html = self.fetcher.fetch(&url).await?;
        Self::parse_episode(&html, episode_slug, &url)
    }
}

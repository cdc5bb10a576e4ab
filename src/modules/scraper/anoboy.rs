/// Anoboy source adapter (secondary source).
///
/// This host has much looser markup than otakudesu: title pages expose little
/// beyond a heading and a synopsis paragraph, and episode links are found by
/// scanning anchors rather than a dedicated listing block. Sparse results are
/// expected parse degradation, not an error.
use crate::modules::catalog::domain::{
    normalize_stubs, AnimePartial, EpisodePartial, EpisodeStub,
};
use crate::modules::scraper::page::PageFetcher;
use crate::modules::scraper::{SourceAdapter, SourceKind};
use crate::shared::errors::{AppError, AppResult};
use crate::log_debug;
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};

pub struct AnoboyAdapter {
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

fn episode_number_re() -> AppResult<Regex> {
    Regex::new(r"(?i)episode[\s-]*(\d+)")
        .map_err(|e| AppError::Internal(format!("Invalid regex: {}", e)))
}

fn trailing_slug_re() -> AppResult<Regex> {
    Regex::new(r"/([^/]+)/?$").map_err(|e| AppError::Internal(format!("Invalid regex: {}", e)))
}

impl AnoboyAdapter {
    pub fn new(base_url: String) -> AppResult<Self> {
        Ok(Self {
            fetcher: PageFetcher::new()?,
            base_url,
        })
    }

    fn page_url(&self, slug: &str) -> String {
        format!("{}/{}", self.base_url, slug)
    }

    fn parse_title(html: &str, slug: &str, url: &str) -> AppResult<AnimePartial> {
        let document = Html::parse_document(html);
        let heading = selector(".entry-title")?;
        let synopsis_sel = selector(".entry-content p")?;

        let title = document
            .select(&heading)
            .next()
            .map(element_text)
            .unwrap_or_default();

        if title.is_empty() {
            return Err(AppError::NotFound(format!("No anime content at {}", url)));
        }

        let synopsis = document
            .select(&synopsis_sel)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty());

        Ok(AnimePartial {
            slug: slug.to_string(),
            title,
            synopsis,
            anoboy_url: Some(url.to_string()),
            ..Default::default()
        })
    }

    fn parse_episode_list(html: &str) -> AppResult<Vec<EpisodeStub>> {
        let document = Html::parse_document(html);
        let anchors = selector(r#"a[href*="episode"]"#)?;
        let number_re = episode_number_re()?;
        let slug_re = trailing_slug_re()?;

        let mut stubs = Vec::new();
        for link in document.select(&anchors) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let text = element_text(link);
            if text.is_empty() {
                continue;
            }

            // Episode number may live in the link text or the URL
            let episode_number = number_re
                .captures(&text)
                .or_else(|| number_re.captures(href))
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

            stubs.push(EpisodeStub {
                episode_number,
                title: Some(text),
                slug,
                url: href.to_string(),
            });
        }

        Ok(normalize_stubs(stubs))
    }

    fn parse_episode(html: &str, slug: &str, url: &str) -> AppResult<EpisodePartial> {
        let document = Html::parse_document(html);
        let heading = selector(".entry-title")?;
        // Direct-file links plus the hosts this site mirrors to; many links
        // carry no "download" marker at all
        let download_anchors = selector(concat!(
            r#"a[href*="download"], a[href*=".mp4"], a[href*=".mkv"], "#,
            r#"a[href*="drive.google.com"], a[href*="mega.nz"], "#,
            r#"a[href*="mediafire"], a[href*="zippyshare"]"#,
        ))?;
        let frames = selector("iframe")?;
        let number_re = episode_number_re()?;
        let quality_re = Regex::new(r"(?i)(\d+p|HD|SD)")
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
            anoboy_url: Some(url.to_string()),
            ..Default::default()
        };

        for link in document.select(&download_anchors) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let text = element_text(link);
            if text.is_empty() {
                continue;
            }
            let quality = quality_re
                .captures(&text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            let provider = download_provider(href);
            if let Err(e) = partial.download_links.insert(&quality, provider, href) {
                log_debug!("Skipping download link on {}: {}", url, e);
            }
        }

        for frame in document.select(&frames) {
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

fn download_provider(href: &str) -> &'static str {
    if href.contains("drive.google.com") {
        "Google Drive"
    } else if href.contains("mega.nz") {
        "Mega"
    } else if href.contains("mediafire") {
        "MediaFire"
    } else if href.contains("zippyshare") {
        "ZippyShare"
    } else {
        "unknown"
    }
}

fn streaming_provider(src: &str) -> &'static str {
    if src.contains("mp4upload") {
        "mp4upload"
    } else if src.contains("streamtape") {
        "streamtape"
    } else if src.contains("doodstream") {
        "doodstream"
    } else if src.contains("fembed") {
        "fembed"
    } else {
        "unknown"
    }
}

#[async_trait]
impl SourceAdapter for AnoboyAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Anoboy
    }

    async fn fetch_title(&self, slug: &str) -> AppResult<AnimePartial> {
        let url = self.page_url(slug);
        let html = self.fetcher.fetch(&url).await?;
        Self::parse_title(&html, slug, &url)
    }

    async fn fetch_episode_list(&self, title_slug: &str) -> AppResult<Vec<EpisodeStub>> {
        let url = self.page_url(title_slug);
        let html = self.fetcher.fetch(&url).await?;
        Self::parse_episode_list(&html)
    }

    async fn fetch_episode(&self, episode_slug: &str) -> AppResult<EpisodePartial> {
        let url = self.page_url(episode_slug);
        let html = self.fetcher.fetch(&url).await?;
        Self::parse_episode(&html, episode_slug, &url)
    }
}

/// Field-level merge of a scraped partial with enrichment data.
///
/// The scraped value always wins when present and non-empty; enrichment only
/// fills gaps. Enrichment is never authoritative.
use crate::modules::catalog::domain::AnimePartial;
use crate::modules::enrichment::EnrichmentData;

pub fn merge_title(scraped: &AnimePartial, enrichment: &EnrichmentData) -> AnimePartial {
    let mut merged = scraped.clone();

    merged.mal_id = scraped.mal_id.or(Some(enrichment.mal_id));
    if merged.title.is_empty() {
        merged.title = enrichment.title.clone();
    }
    merged.japanese_title = scraped
        .japanese_title
        .clone()
        .or_else(|| enrichment.title_japanese.clone());
    merged.synopsis = scraped
        .synopsis
        .clone()
        .or_else(|| enrichment.synopsis.clone());
    merged.rating = scraped.rating.or(enrichment.score);
    merged.anime_type = scraped.anime_type.or(enrichment.anime_type);
    merged.status = scraped.status.or(enrichment.status);
    merged.episode_count = scraped.episode_count.or(enrichment.episodes);
    merged.duration = scraped
        .duration
        .clone()
        .or_else(|| enrichment.duration.clone());
    merged.release_date = scraped
        .release_date
        .clone()
        .or_else(|| enrichment.release_date.clone());
    merged.studio = scraped.studio.clone().or_else(|| enrichment.studio.clone());
    if merged.genres.is_empty() {
        merged.genres = enrichment.genres.clone();
    }

    merged
}

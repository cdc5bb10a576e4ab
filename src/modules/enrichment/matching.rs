/// Fuzzy title matching between scraped titles and enrichment candidates.
use crate::modules::enrichment::EnrichmentData;

/// Normalize a title for comparison: lowercase, strip non-alphanumeric,
/// collapse whitespace.
pub fn normalize_title(title: &str) -> String {
    let stripped: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Similarity between two titles in [0.0, 1.0]:
/// `1 - edit_distance / max(len_a, len_b)` over the normalized strings.
pub fn calculate_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&normalize_title(a), &normalize_title(b))
}

/// Pick the best enrichment candidate for a scraped title.
///
/// An exact case-insensitive match on any of a candidate's titles wins
/// outright. Otherwise the candidate with the highest similarity is chosen;
/// when even the best score is at or below the threshold the top search
/// result is used instead of discarding enrichment entirely.
pub fn select_best_match<'a>(
    query: &str,
    candidates: &'a [EnrichmentData],
) -> Option<&'a EnrichmentData> {
    const SIMILARITY_THRESHOLD: f64 = 0.6;

    if candidates.is_empty() {
        return None;
    }

    let query_lower = query.to_lowercase();
    for candidate in candidates {
        if candidate
            .all_titles()
            .iter()
            .any(|t| t.to_lowercase() == query_lower)
        {
            return Some(candidate);
        }
    }

    let mut best = &candidates[0];
    let mut best_score = 0.0f64;
    for candidate in candidates {
        for title in candidate.all_titles() {
            let score = calculate_similarity(query, title);
            if score > best_score {
                best_score = score;
                best = candidate;
            }
        }
    }

    if best_score > SIMILARITY_THRESHOLD {
        Some(best)
    } else {
        // Low-confidence fuzzy match: trust the search engine's ranking
        Some(&candidates[0])
    }
}

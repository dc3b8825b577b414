use crate::config::RESULT_LIMIT;
use crate::document::{Document, Match, SearchResult};

/// Similarity as a whole percentage, clamped to 0..=100
pub fn relevance_score(similarity: f64) -> u8 {
    if similarity.is_nan() {
        return 0;
    }
    (similarity * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Score, sort (stable, descending) and keep the top [`RESULT_LIMIT`].
///
/// Truncation happens after sorting; `snippets_for` runs only for the
/// documents that survive the cut.
pub fn rank<F>(matches: Vec<Match>, snippets_for: F) -> Vec<SearchResult>
where
    F: FnMut(&Document) -> Vec<String>,
{
    rank_with_limit(matches, RESULT_LIMIT, snippets_for)
}

pub fn rank_with_limit<F>(matches: Vec<Match>, limit: usize, mut snippets_for: F) -> Vec<SearchResult>
where
    F: FnMut(&Document) -> Vec<String>,
{
    let mut scored: Vec<(u8, Document)> = matches
        .into_iter()
        .map(|m| (relevance_score(m.similarity), m.document))
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(limit);

    scored
        .into_iter()
        .map(|(relevance_score, document)| SearchResult {
            matched_segments: snippets_for(&document),
            document,
            relevance_score,
        })
        .collect()
}

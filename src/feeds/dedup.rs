// src/feeds/dedup.rs
//! Cross-source duplicate collapse. The same story routinely arrives from
//! two feeds with slightly different headlines; only the first copy (in the
//! already-sorted merge order) survives.

use std::collections::HashSet;

use crate::feeds::types::Article;

/// Empirically chosen; see `PipelineSettings` for the override.
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.6;

/// Two articles count as the same story when their lowercased titles are
/// equal, one contains the other, or they come from the same source and
/// share most of their significant words.
pub fn similar(a: &Article, b: &Article, overlap_threshold: f64) -> bool {
    let ta = a.title.trim().to_lowercase();
    let tb = b.title.trim().to_lowercase();
    if ta == tb || ta.contains(&tb) || tb.contains(&ta) {
        return true;
    }
    a.source == b.source && token_overlap(&ta, &tb) > overlap_threshold
}

/// Shared words longer than 3 characters, over the smaller title's word
/// count. Titles are expected lowercased.
fn token_overlap(a: &str, b: &str) -> f64 {
    let a_words: Vec<&str> = a.split_whitespace().collect();
    let b_words: Vec<&str> = b.split_whitespace().collect();
    let min_len = a_words.len().min(b_words.len());
    if min_len == 0 {
        return 0.0;
    }
    let a_set: HashSet<&str> = a_words.into_iter().filter(|w| w.len() > 3).collect();
    let shared: HashSet<&str> = b_words
        .into_iter()
        .filter(|w| w.len() > 3 && a_set.contains(w))
        .collect();
    shared.len() as f64 / min_len as f64
}

/// Linear pass; each candidate is compared against everything already kept,
/// so earlier (newer, post-sort) copies win. O(n²), fine for tens of items.
pub fn dedup_articles(articles: Vec<Article>, overlap_threshold: f64) -> Vec<Article> {
    let mut kept: Vec<Article> = Vec::with_capacity(articles.len());
    for candidate in articles {
        if !kept.iter().any(|k| similar(k, &candidate, overlap_threshold)) {
            kept.push(candidate);
        }
    }
    kept
}

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::{LibraryItem, ParsedReference};

/// Weight of each similarity signal.
///
/// A signal only counts toward the denominator when both the reference and
/// the library item carry the data it compares.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityWeights {
    pub doi: f64,
    pub year: f64,
    pub title: f64,
    pub first_author: f64,
    pub authors: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            doi: 10.0,
            year: 2.0,
            title: 5.0,
            first_author: 1.5,
            authors: 1.5,
        }
    }
}

/// Normalize text for fuzzy comparison: lowercase, drop everything that is
/// neither a word character nor whitespace, collapse whitespace.
pub fn normalize_text(text: &str) -> String {
    static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
    let lowered = text.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn significant_words(text: &str) -> HashSet<&str> {
    text.split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .collect()
}

/// Jaccard similarity of the word sets of two normalized strings.
///
/// Only words longer than two characters are considered. Two empty sets are
/// identical (1.0); one empty set against a non-empty one scores 0.0.
pub fn fuzzy_match(a: &str, b: &str) -> f64 {
    let words_a = significant_words(a);
    let words_b = significant_words(b);

    match (words_a.is_empty(), words_b.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    intersection as f64 / union as f64
}

/// The first four-digit run in a free-form date string.
pub fn year_of(date: &str) -> Option<&str> {
    static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());
    YEAR_RE.find(date).map(|m| m.as_str())
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Score how likely `item` is the work cited by `reference`, in `[0, 1]`.
///
/// Returns 0 when no signal is comparable (no shared data means no match).
pub fn calculate_similarity(
    reference: &ParsedReference,
    item: &LibraryItem,
    weights: &SimilarityWeights,
) -> f64 {
    let mut score = 0.0;
    let mut total_weight = 0.0;

    if let (Some(ref_doi), Some(item_doi)) = (present(&reference.doi), present(&item.doi)) {
        total_weight += weights.doi;
        if ref_doi.eq_ignore_ascii_case(item_doi) {
            score += weights.doi;
        }
    }

    if let (Some(ref_year), Some(item_year)) = (
        present(&reference.year),
        present(&item.date).and_then(year_of),
    ) {
        total_weight += weights.year;
        if ref_year == item_year {
            score += weights.year;
        }
    }

    if let (Some(ref_title), Some(item_title)) = (present(&reference.title), present(&item.title)) {
        let title_sim = fuzzy_match(&normalize_text(ref_title), &normalize_text(item_title));
        total_weight += weights.title;
        score += weights.title * title_sim;
    }

    if let Some(ref_authors) = present(&reference.authors) {
        let first_last = item
            .creators
            .first()
            .map(|c| c.last_name.trim())
            .filter(|s| !s.is_empty());
        if let Some(last_name) = first_last {
            total_weight += weights.first_author;
            if ref_authors.to_lowercase().contains(&last_name.to_lowercase()) {
                score += weights.first_author;
            }
        }

        if !item.creators.is_empty() {
            let creators = item
                .creators
                .iter()
                .map(|c| c.full_name())
                .collect::<Vec<_>>()
                .join(" ");
            let authors_sim = fuzzy_match(&normalize_text(ref_authors), &normalize_text(&creators));
            total_weight += weights.authors;
            score += weights.authors * authors_sim;
        }
    }

    if total_weight == 0.0 {
        return 0.0;
    }
    (score / total_weight).clamp(0.0, 1.0)
}

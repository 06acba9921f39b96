//! Ranking library items against extracted references.

use std::collections::BTreeMap;

use crate::matching::{SimilarityWeights, calculate_similarity};
use crate::{LibraryItem, MatchResult, ParsedReference};

/// Thresholds and weights for library matching.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Candidates scoring below this are discarded (default 0.5).
    pub min_similarity: f64,
    /// Best-match score at which a reference counts as "in library" (default 0.7).
    /// Applied by [`is_in_library`], never by the matcher itself.
    pub in_library_threshold: f64,
    pub weights: SimilarityWeights,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_similarity: 0.5,
            in_library_threshold: 0.7,
            weights: SimilarityWeights::default(),
        }
    }
}

/// Rank `items` against one reference.
///
/// Keeps candidates scoring at least `config.min_similarity`, sorted by
/// descending similarity. Equal scores keep the order in which candidates
/// were supplied.
pub fn find_matches(
    reference: &ParsedReference,
    items: &[LibraryItem],
    config: &MatchConfig,
) -> Vec<MatchResult> {
    let mut matches: Vec<MatchResult> = items
        .iter()
        .filter_map(|item| {
            let similarity = calculate_similarity(reference, item, &config.weights);
            (similarity > 0.0 && similarity >= config.min_similarity).then(|| MatchResult {
                item_id: item.id.clone(),
                similarity,
                item: item.clone(),
            })
        })
        .collect();

    // sort_by is stable: ties stay in candidate order
    matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    matches
}

/// Rank library items for every reference of a document.
///
/// The map is keyed by [`ParsedReference::index`]. References without any
/// qualifying match are absent from the map. When two references share an
/// index, the later one wins.
pub fn match_references(
    references: &[ParsedReference],
    items: &[LibraryItem],
    config: &MatchConfig,
) -> BTreeMap<usize, Vec<MatchResult>> {
    let mut by_index = BTreeMap::new();
    for reference in references {
        let matches = find_matches(reference, items, config);
        if matches.is_empty() {
            by_index.remove(&reference.index);
        } else {
            by_index.insert(reference.index, matches);
        }
    }
    tracing::debug!(
        references = references.len(),
        candidates = items.len(),
        matched = by_index.len(),
        "matched references against library"
    );
    by_index
}

/// Whether the best (first) match is strong enough to show the reference as
/// already in the library.
pub fn is_in_library(matches: &[MatchResult], config: &MatchConfig) -> bool {
    matches
        .first()
        .is_some_and(|best| best.similarity >= config.in_library_threshold)
}

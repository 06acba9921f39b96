use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod backend;
pub mod config_file;
pub mod library;
pub mod matching;
pub mod session;

// Re-export for convenience
pub use backend::{BackendError, PageTextBackend};
pub use library::{MatchConfig, find_matches, is_in_library, match_references};
pub use matching::{SimilarityWeights, calculate_similarity, fuzzy_match, normalize_text};
pub use session::{AnalysisGuard, AnalysisSession, DurationStats};

/// Maximum stored length of [`ParsedReference::text`], in characters.
pub const MAX_TEXT_CHARS: usize = 500;
/// Maximum stored length of [`ParsedReference::title`], in characters.
pub const MAX_TITLE_CHARS: usize = 200;
/// Maximum stored length of [`ParsedReference::authors`], in characters.
pub const MAX_AUTHORS_CHARS: usize = 250;
/// Author strings shorter than this are treated as extraction noise.
pub const MIN_AUTHORS_CHARS: usize = 3;

/// One bibliography entry extracted from a document.
///
/// Optional fields are `None` when they could not be extracted with
/// confidence; an empty string never stands in for "unknown".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReference {
    /// Citation ordinal as it appeared in the text (1-based).
    pub index: usize,
    /// Raw citation string, at most [`MAX_TEXT_CHARS`] characters.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

impl ParsedReference {
    /// Apply the post-extraction sanity filter.
    ///
    /// Every record goes through this regardless of where it came from
    /// (heuristic segmentation or an LLM-returned block):
    /// - `text`, `title` and `authors` are truncated to their bounds
    /// - blank optional fields become `None`
    /// - `authors` shorter than [`MIN_AUTHORS_CHARS`] or starting with a digit
    ///   is dropped
    pub fn sanitize(mut self) -> Self {
        self.text = truncate_chars(self.text.trim(), MAX_TEXT_CHARS);
        self.doi = non_blank(self.doi);
        self.year = non_blank(self.year);
        self.title = non_blank(self.title).map(|t| truncate_chars(&t, MAX_TITLE_CHARS));
        self.authors = non_blank(self.authors)
            .filter(|a| {
                a.chars().count() >= MIN_AUTHORS_CHARS
                    && !a.chars().next().is_some_and(|c| c.is_ascii_digit())
            })
            .map(|a| truncate_chars(&a, MAX_AUTHORS_CHARS));
        self
    }
}

fn non_blank(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Truncate `s` to at most `max` characters without splitting a codepoint.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

/// One creator (author/editor) of a library item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl Creator {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// "First Last", trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// An item already present in the local library.
///
/// Only the fields the matcher reads are modelled; the store that owns the
/// items lives outside this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItem {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Free-form publication date (e.g. "2020", "2020-05-01", "May 2020").
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub creators: Vec<Creator>,
}

/// A candidate library item for one reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub item_id: String,
    /// Weighted similarity in `[0, 1]`.
    pub similarity: f64,
    pub item: LibraryItem,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("analysis already in progress for item {0}")]
    AnalysisInProgress(String),
}

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ParsingConfig;
use crate::identifiers::YEAR;
use crate::strategy::first_success;

/// Segmentation strategy identifier, in the order strategies are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentationStrategy {
    /// `[n]`, line-leading `n.` or line-leading `(n)` markers.
    Numbered,
    /// `Lastname, I. (YYYY)` author-year entries.
    AuthorParenYear,
    /// `Lastname, I., YYYY.` author-year entries.
    AuthorCommaYear,
    /// Any `Lastname, I.` that starts a line or follows a sentence end.
    LooseAuthor,
}

impl SegmentationStrategy {
    pub const ORDER: [SegmentationStrategy; 4] = [
        SegmentationStrategy::Numbered,
        SegmentationStrategy::AuthorParenYear,
        SegmentationStrategy::AuthorCommaYear,
        SegmentationStrategy::LooseAuthor,
    ];

    fn boundaries(self) -> fn(&str, &ParsingConfig) -> Vec<usize> {
        match self {
            SegmentationStrategy::Numbered => numbered_boundaries,
            SegmentationStrategy::AuthorParenYear => author_paren_year_boundaries,
            SegmentationStrategy::AuthorCommaYear => author_comma_year_boundaries,
            SegmentationStrategy::LooseAuthor => loose_author_boundaries,
        }
    }
}

/// Result of segmenting a references region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationResult {
    /// `None` when no strategy found a single boundary and the whole region
    /// was kept as one segment.
    pub strategy: Option<SegmentationStrategy>,
    pub segments: Vec<String>,
}

// Surname followed by one to three initials: "Smith, J." / "O'Neil, A.-B."
const AUTHOR: &str = r"\p{Lu}[\p{L}'’\-]+,\s+(?:\p{Lu}\.[\s\-]*){1,3}";

fn author_list() -> String {
    format!(r"{AUTHOR}(?:,?\s*(?:&|and)?\s*{AUTHOR}){{0,8}}")
}

/// Split a references region into raw reference strings.
///
/// Strategies are tried in [`SegmentationStrategy::ORDER`]; the first one
/// yielding at least `min_segments` segments wins. If none does, the first
/// strategy that found any boundary is used, and failing that the whole
/// region is one segment.
pub fn segment_references(text: &str) -> SegmentationResult {
    segment_references_with_config(text, &ParsingConfig::default())
}

type Segmenter = fn(&str, &ParsingConfig) -> Option<Vec<String>>;

/// Config-aware version of [`segment_references`].
pub fn segment_references_with_config(text: &str, config: &ParsingConfig) -> SegmentationResult {
    let strategies: [(SegmentationStrategy, Segmenter); 4] = [
        (SegmentationStrategy::Numbered, try_numbered),
        (SegmentationStrategy::AuthorParenYear, try_author_paren_year),
        (SegmentationStrategy::AuthorCommaYear, try_author_comma_year),
        (SegmentationStrategy::LooseAuthor, try_loose_author),
    ];

    if let Some((strategy, segments)) = first_success(&strategies, text, config) {
        tracing::debug!(?strategy, count = segments.len(), "segmented references");
        return SegmentationResult {
            strategy: Some(strategy),
            segments,
        };
    }

    for strategy in SegmentationStrategy::ORDER {
        let boundaries = strategy.boundaries()(text, config);
        if !boundaries.is_empty() {
            let segments = split_at_boundaries(text, &boundaries);
            tracing::debug!(
                ?strategy,
                count = segments.len(),
                "no strategy reached the minimum, using first with boundaries"
            );
            return SegmentationResult {
                strategy: Some(strategy),
                segments,
            };
        }
    }

    let whole = text.trim();
    SegmentationResult {
        strategy: None,
        segments: if whole.is_empty() {
            vec![]
        } else {
            vec![whole.to_string()]
        },
    }
}

/// Cut `text` before every boundary. Text ahead of the first boundary is kept
/// as its own segment; empty segments are dropped.
fn split_at_boundaries(text: &str, boundaries: &[usize]) -> Vec<String> {
    let mut cuts: Vec<usize> = boundaries.to_vec();
    cuts.sort_unstable();
    cuts.dedup();

    let mut segments = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for &cut in cuts.iter().chain(std::iter::once(&text.len())) {
        let piece = text[start..cut].trim();
        if !piece.is_empty() {
            segments.push(piece.to_string());
        }
        start = cut;
    }
    segments
}

fn enough(text: &str, boundaries: Vec<usize>, config: &ParsingConfig) -> Option<Vec<String>> {
    if boundaries.is_empty() {
        return None;
    }
    let segments = split_at_boundaries(text, &boundaries);
    (segments.len() >= config.min_segments).then_some(segments)
}

fn try_numbered(text: &str, config: &ParsingConfig) -> Option<Vec<String>> {
    enough(text, numbered_boundaries(text, config), config)
}

fn try_author_paren_year(text: &str, config: &ParsingConfig) -> Option<Vec<String>> {
    enough(text, author_paren_year_boundaries(text, config), config)
}

fn try_author_comma_year(text: &str, config: &ParsingConfig) -> Option<Vec<String>> {
    enough(text, author_comma_year_boundaries(text, config), config)
}

fn try_loose_author(text: &str, config: &ParsingConfig) -> Option<Vec<String>> {
    enough(text, loose_author_boundaries(text, config), config)
}

/// Start of every `[n]`, line-leading `n.` and line-leading `(n)` marker.
pub fn numbered_boundaries(text: &str, config: &ParsingConfig) -> Vec<usize> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?m)\[\d{1,3}\]|^[ \t]*\d{1,3}\.\s|^[ \t]*\(\d{1,3}\)").unwrap());

    let re = config.numbered_segment_re.as_ref().unwrap_or(&RE);
    re.find_iter(text)
        .map(|m| {
            let s = m.as_str();
            m.start() + (s.len() - s.trim_start().len())
        })
        .collect()
}

/// Start of every `Lastname, I. (YYYY)` entry (an author list is allowed
/// before the year).
pub fn author_paren_year_boundaries(text: &str, _config: &ParsingConfig) -> Vec<usize> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"{}\s*\({YEAR}[a-z]?\)", author_list())).unwrap());
    RE.find_iter(text).map(|m| m.start()).collect()
}

/// Start of every `Lastname, I., YYYY.` entry.
pub fn author_comma_year_boundaries(text: &str, _config: &ParsingConfig) -> Vec<usize> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"{},?\s*{YEAR}[a-z]?\.", author_list())).unwrap());
    RE.find_iter(text).map(|m| m.start()).collect()
}

/// Start of every `Lastname, I.` at the beginning of the text, of a line, or
/// right after a sentence-ending period.
pub fn loose_author_boundaries(text: &str, _config: &ParsingConfig) -> Vec<usize> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\p{Lu}[\p{L}'’\-]+,\s+\p{Lu}\.").unwrap());

    RE.find_iter(text)
        .map(|m| m.start())
        .filter(|&start| {
            let before = &text[..start];
            let trimmed = before.trim_end();
            trimmed.is_empty()
                || trimmed.ends_with('.')
                || before[trimmed.len()..].contains('\n')
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParsingConfigBuilder;

    #[test]
    fn test_segment_ieee_brackets() {
        let text = "\n[1] First reference text here.\n[2] Second reference text here.\n[3] Third reference.\n";
        let result = segment_references(text);
        assert_eq!(result.strategy, Some(SegmentationStrategy::Numbered));
        assert_eq!(result.segments.len(), 3);
        assert!(result.segments[0].starts_with("[1] First"));
        assert!(result.segments[2].starts_with("[3] Third"));
    }

    #[test]
    fn test_segment_brackets_without_newlines() {
        let text = "[1] First ref 2001. [2] Second ref 2002. [3] Third ref 2003.";
        let result = segment_references(text);
        assert_eq!(result.segments.len(), 3);
        assert_eq!(result.segments[1], "[2] Second ref 2002.");
    }

    #[test]
    fn test_segment_numbered_lines() {
        let text = "1. First ref content.\n2. Second ref content.\n3. Third ref content.\n";
        let result = segment_references(text);
        assert_eq!(result.strategy, Some(SegmentationStrategy::Numbered));
        assert_eq!(result.segments.len(), 3);
        assert!(result.segments[1].starts_with("2. Second"));
    }

    #[test]
    fn test_segment_parenthesized_numbers() {
        let text = "(1) First ref content.\n(2) Second ref content.\n(3) Third ref content.";
        let result = segment_references(text);
        assert_eq!(result.segments.len(), 3);
        assert!(result.segments[2].starts_with("(3) Third"));
    }

    #[test]
    fn test_segment_author_paren_year() {
        let text = "Smith, J., & Doe, A. (2020). Widgets. J. Widg. Brown, K. (2019). Gadgets. Gadget Rev. Clark, E. F. (2018). Sprockets. Sprocket Q.";
        let result = segment_references(text);
        assert_eq!(result.strategy, Some(SegmentationStrategy::AuthorParenYear));
        assert_eq!(result.segments.len(), 3);
        assert!(result.segments[0].starts_with("Smith, J., & Doe, A. (2020)"));
        assert!(result.segments[1].starts_with("Brown, K. (2019)"));
        assert!(result.segments[2].starts_with("Clark, E. F. (2018)"));
    }

    #[test]
    fn test_segment_author_comma_year() {
        let text = "Adams, B., 2001. Widgets. J. Widg. Brown, D., 2003. Gadgets. Gadget Rev. Clark, E., Davis, G., 2005. Sprockets. Proc.";
        let result = segment_references(text);
        assert_eq!(result.strategy, Some(SegmentationStrategy::AuthorCommaYear));
        assert_eq!(result.segments.len(), 3);
        assert!(result.segments[2].starts_with("Clark, E., Davis, G., 2005."));
    }

    #[test]
    fn test_segment_loose_author() {
        let text = "Adams, B. Widgets and things 2001.\nBrown, D. Gadgets in practice 2003.\nClark, E. On sprockets 2005.";
        let result = segment_references(text);
        assert_eq!(result.strategy, Some(SegmentationStrategy::LooseAuthor));
        assert_eq!(result.segments.len(), 3);
    }

    #[test]
    fn test_loose_author_skips_mid_sentence_names() {
        let text = "as discussed by Smith, J. in prior work";
        assert!(loose_author_boundaries(text, &ParsingConfig::default()).is_empty());
    }

    #[test]
    fn test_prefix_before_first_boundary_is_kept() {
        let text = "Header residue\n[1] One.\n[2] Two.\n[3] Three.";
        let result = segment_references(text);
        assert_eq!(result.segments.len(), 4);
        assert_eq!(result.segments[0], "Header residue");
    }

    #[test]
    fn test_below_minimum_uses_first_strategy_with_boundaries() {
        let text = "\n[1] Smith, J. (2020). A Study of Widgets. Journal of Widgets, 12(3), 1-10.";
        let result = segment_references(text);
        assert_eq!(result.strategy, Some(SegmentationStrategy::Numbered));
        assert_eq!(result.segments.len(), 1);
        assert!(result.segments[0].starts_with("[1] Smith"));
    }

    #[test]
    fn test_no_boundaries_keeps_whole_region() {
        let result = segment_references("  just some prose without markers  ");
        assert_eq!(result.strategy, None);
        assert_eq!(result.segments, vec!["just some prose without markers".to_string()]);
        assert!(segment_references("   ").segments.is_empty());
    }

    #[test]
    fn test_custom_min_segments() {
        let config = ParsingConfigBuilder::new().min_segments(2).build().unwrap();
        let text = "Smith, J. (2020). Widgets. Brown, K. (2019). Gadgets.";
        let result = segment_references_with_config(text, &config);
        assert_eq!(result.strategy, Some(SegmentationStrategy::AuthorParenYear));
        assert_eq!(result.segments.len(), 2);
    }

    #[test]
    fn test_custom_numbered_regex() {
        let config = ParsingConfigBuilder::new()
            .numbered_segment_regex(r"\{\d+\}")
            .build()
            .unwrap();
        let text = "{1} First ref text here.\n{2} Second ref text here.\n{3} Third ref.";
        let result = segment_references_with_config(text, &config);
        assert_eq!(result.segments.len(), 3);
        assert!(result.segments[0].starts_with("{1} First"));
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let text = "[1] A, B. (2001). X.\n[2] C, D. (2002). Y.\n[3] E, F. (2003). Z.";
        assert_eq!(segment_references(text), segment_references(text));
    }
}

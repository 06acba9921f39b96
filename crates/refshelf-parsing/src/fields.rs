use once_cell::sync::Lazy;
use regex::Regex;

use crate::identifiers::YearToken;

/// Raw title window taken after the year token, in characters.
const TITLE_WINDOW_CHARS: usize = 150;

/// Extract the title: the text right after the year token, up to the next
/// sentence boundary or `In:` venue marker.
///
/// Only the first 150 characters after the year are considered. When no
/// boundary falls inside that window the whole window is the title.
pub fn extract_title(ref_text: &str, year: &YearToken) -> Option<String> {
    static END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.?!](?:\s|$)|\bIn:").unwrap());

    let after = ref_text.get(year.end..)?;
    let after = after.trim_start_matches(|c: char| c.is_whitespace() || ".,:;)]".contains(c));

    let window_end = after
        .char_indices()
        .nth(TITLE_WINDOW_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(after.len());
    let window = &after[..window_end];

    let end = match END_RE.find(window) {
        // Keep '?' and '!'; they belong to the title
        Some(m) if window[m.start()..].starts_with(['?', '!']) => m.start() + 1,
        Some(m) => m.start(),
        None => window.len(),
    };

    let title = window[..end].trim().trim_matches('"').trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Extract the author string: everything before the year token, minus the
/// citation marker.
///
/// A leading "and"/"from" is stripped along with trailing separators. The
/// minimum-length and digit checks are applied later by
/// `ParsedReference::sanitize`.
pub fn extract_authors(ref_text: &str, year: &YearToken, marker_end: usize) -> Option<String> {
    static LEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:and|from)\s+").unwrap());

    let start = if marker_end <= year.start { marker_end } else { 0 };
    let before = ref_text.get(start..year.start)?.trim();
    let before = LEADING_RE.replace(before, "");
    let authors = before.trim_end_matches(|c: char| c.is_whitespace() || "(,;:".contains(c));

    (!authors.is_empty()).then(|| authors.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{extract_marker, extract_year};

    fn title_of(text: &str) -> Option<String> {
        extract_title(text, &extract_year(text).unwrap())
    }

    fn authors_of(text: &str) -> Option<String> {
        let marker_end = extract_marker(text).map(|m| m.end).unwrap_or(0);
        extract_authors(text, &extract_year(text).unwrap(), marker_end)
    }

    #[test]
    fn test_title_after_parenthesized_year() {
        let text = "[1] Smith, J. (2020). A Study of Widgets. Journal of Widgets, 12(3), 1-10.";
        assert_eq!(title_of(text), Some("A Study of Widgets".to_string()));
    }

    #[test]
    fn test_title_after_comma_year() {
        let text = "Smith, J., 2019. Gadgets in practice. Gadget Rev. 4, 1-2.";
        assert_eq!(title_of(text), Some("Gadgets in practice".to_string()));
    }

    #[test]
    fn test_title_stops_at_in_marker() {
        let text = "Doe, A. (2018) Sprockets for everyone In: Proc. Sprocket Conf.";
        assert_eq!(title_of(text), Some("Sprockets for everyone".to_string()));
    }

    #[test]
    fn test_title_keeps_question_mark() {
        let text = "Doe, A. (2018). Do widgets dream? Widget Q. 1.";
        assert_eq!(title_of(text), Some("Do widgets dream?".to_string()));
    }

    #[test]
    fn test_title_window_is_bounded() {
        let long = "word ".repeat(60);
        let text = format!("Doe, A. (2018). {long}");
        let title = title_of(&text).unwrap();
        assert!(title.chars().count() <= TITLE_WINDOW_CHARS);
        assert!(title.starts_with("word word"));
    }

    #[test]
    fn test_title_missing_after_trailing_year() {
        assert_eq!(title_of("Doe, A. Widget handbook. Widget Press, 2018."), None);
    }

    #[test]
    fn test_authors_strip_marker_and_trailing_punctuation() {
        let text = "[1] Smith, J. (2020). A Study of Widgets.";
        assert_eq!(authors_of(text), Some("Smith, J.".to_string()));
    }

    #[test]
    fn test_authors_before_comma_year() {
        let text = "Clark, E., Davis, G., 2005. Sprockets.";
        assert_eq!(authors_of(text), Some("Clark, E., Davis, G.".to_string()));
    }

    #[test]
    fn test_authors_strip_leading_and_from() {
        assert_eq!(
            authors_of("and Brown, K. (2019). Gadgets."),
            Some("Brown, K.".to_string())
        );
        assert_eq!(
            authors_of("From Brown, K. (2019). Gadgets."),
            Some("Brown, K.".to_string())
        );
    }

    #[test]
    fn test_authors_empty_when_year_leads() {
        assert_eq!(authors_of("[2] (2019). Untitled report."), None);
    }
}

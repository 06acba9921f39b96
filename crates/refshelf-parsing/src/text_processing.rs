use once_cell::sync::Lazy;
use regex::Regex;

/// Expand common typographic ligatures found in PDFs.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

/// Normalize the whitespace of one page.
///
/// Runs of horizontal whitespace become one space, every line is trimmed, and
/// blank lines are dropped. Line breaks are kept so that line-leading citation
/// markers stay detectable.
pub fn normalize_page(page: &str) -> String {
    static HSPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());

    let page = expand_ligatures(&page.replace("\r\n", "\n").replace('\r', "\n"));
    let page = HSPACE_RE.replace_all(&page, " ");
    page.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Normalize per-page text and join the pages with single spaces.
///
/// Empty pages are skipped.
pub fn normalize_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .map(|p| normalize_page(p.as_ref()))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse all whitespace, including line breaks, to single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Smallest char boundary at or after `fraction` of `text`'s byte length.
pub(crate) fn boundary_at_fraction(text: &str, fraction: f64) -> usize {
    let target = (text.len() as f64 * fraction.clamp(0.0, 1.0)) as usize;
    // Don't split in the middle of a UTF-8 codepoint
    text.char_indices()
        .map(|(i, _)| i)
        .find(|&i| i >= target)
        .unwrap_or(text.len())
}

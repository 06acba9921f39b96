use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{DEFAULT_SECTION_HEADERS, ParsingConfig, header_regex};
use crate::identifiers::YEAR;
use crate::strategy::first_success;
use crate::text_processing::boundary_at_fraction;

/// Which heuristic located the references section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocatorStrategy {
    /// An explicit "References"/"Bibliography"/... header.
    Header,
    /// A `[1]`, `1.` or `(1)` opener in the document tail.
    NumberedOpener,
    /// A dense run of `Lastname, I. ... YYYY.` citations in the document tail.
    AuthorYearDensity,
}

/// Where the references section starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionStart {
    /// Byte offset into the normalized text.
    At {
        offset: usize,
        found_by: LocatorStrategy,
    },
    /// Nothing was found; treat the tail past the cutoff fraction as references.
    TailCutoff,
}

impl SectionStart {
    /// Resolve to a byte offset into `text`, applying `cutoff_fraction` for
    /// [`SectionStart::TailCutoff`].
    pub fn offset_in(&self, text: &str, cutoff_fraction: f64) -> usize {
        match *self {
            SectionStart::At { offset, .. } => offset.min(text.len()),
            SectionStart::TailCutoff => boundary_at_fraction(text, cutoff_fraction),
        }
    }

    pub fn found_by(&self) -> Option<LocatorStrategy> {
        match self {
            SectionStart::At { found_by, .. } => Some(*found_by),
            SectionStart::TailCutoff => None,
        }
    }
}

/// Locate the start of the references section in normalized document text.
///
/// Tries, in order: an explicit header, a numbered opener in the last 15% of
/// the document, a dense author-year run in the same tail. If all fail the
/// result is [`SectionStart::TailCutoff`]; this never reports "not found".
pub fn locate_references(text: &str) -> SectionStart {
    locate_references_with_config(text, &ParsingConfig::default())
}

type Locator = fn(&str, &ParsingConfig) -> Option<usize>;

/// Config-aware version of [`locate_references`].
pub fn locate_references_with_config(text: &str, config: &ParsingConfig) -> SectionStart {
    let locators: [(LocatorStrategy, Locator); 3] = [
        (LocatorStrategy::Header, find_header),
        (LocatorStrategy::NumberedOpener, find_numbered_opener),
        (LocatorStrategy::AuthorYearDensity, find_dense_author_year),
    ];

    match first_success(&locators, text, config) {
        Some((found_by, offset)) => {
            tracing::debug!(
                ?found_by,
                offset,
                len = text.len(),
                "located references section"
            );
            SectionStart::At { offset, found_by }
        }
        None => {
            tracing::debug!(
                len = text.len(),
                "no references section signal, using tail cutoff"
            );
            SectionStart::TailCutoff
        }
    }
}

/// Find the first line-like segment that is a bibliography header.
///
/// Segments are the pieces between `.` and newline characters. A header may
/// share its segment with the first entry when the page text has no line
/// breaks. Returns the offset just past the header, or past the whole match
/// for a custom regex without a `header` group.
pub fn find_header(text: &str, config: &ParsingConfig) -> Option<usize> {
    static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
        let terms: Vec<String> = DEFAULT_SECTION_HEADERS
            .iter()
            .map(|s| s.to_string())
            .collect();
        header_regex(&terms).unwrap()
    });

    let header_re = config.section_header_re.as_ref().unwrap_or(&HEADER_RE);

    let mut seg_start = 0;
    for piece in text.split(['.', '\n']) {
        let start = seg_start;
        // Both separators are one byte wide
        seg_start += piece.len() + 1;

        let trimmed = piece.trim();
        let Some(caps) = header_re.captures(trimmed) else {
            continue;
        };
        let Some(end) = caps
            .name("header")
            .or_else(|| caps.get(0))
            .map(|m| m.end())
        else {
            continue;
        };
        let leading = piece.len() - piece.trim_start().len();
        return Some(start + leading + end);
    }
    None
}

/// Find a `[1]`, line-leading `1.` or `(1)` opener followed by a capital
/// letter in the tail of the document.
pub fn find_numbered_opener(text: &str, config: &ParsingConfig) -> Option<usize> {
    static OPENER_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?m)\[1\]\s*\p{Lu}|^[ \t]*1\.\s*\p{Lu}|\(1\)\s*\p{Lu}").unwrap());

    let tail_start = boundary_at_fraction(text, 1.0 - config.tail_fraction);
    // find_at keeps `^` anchored to real line starts
    let m = OPENER_RE.find_at(text, tail_start)?;
    let opener = &text[m.start()..m.end()];
    let leading = opener.len() - opener.trim_start().len();
    Some(m.start() + leading)
}

/// Find a run of closely spaced `Lastname, I.I. ... YYYY.` citations in the
/// tail of the document and back up to the start of the line holding the
/// first one.
pub fn find_dense_author_year(text: &str, config: &ParsingConfig) -> Option<usize> {
    static AUTHOR_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(&format!(
            r"\p{{Lu}}[\p{{L}}'’\-]+,\s*(?:\p{{Lu}}\.\s*){{1,3}}.{{0,200}}?\b{YEAR}[a-z]?\."
        ))
        .unwrap()
    });

    let tail_start = boundary_at_fraction(text, 1.0 - config.tail_fraction);
    let tail = &text[tail_start..];

    let mut run_start = None;
    let mut run_len = 0;
    let mut prev_end = 0;
    for m in AUTHOR_YEAR_RE.find_iter(tail) {
        if run_start.is_some() && m.start() - prev_end <= config.dense_run_max_gap {
            run_len += 1;
        } else {
            run_start = Some(m.start());
            run_len = 1;
        }
        prev_end = m.end();

        if run_len >= config.dense_run_min {
            let first = tail_start + run_start?;
            let line_start = text[..first].rfind('\n').map(|i| i + 1).unwrap_or(0);
            return Some(line_start.max(tail_start));
        }
    }
    None
}

use once_cell::sync::Lazy;
use regex::Regex;

/// A publication year token between 1500 and 2099, with an optional
/// disambiguation suffix ("2020a").
pub(crate) const YEAR: &str = r"(?:1[5-9]|20)\d{2}";

static ANY_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\b({YEAR})[a-z]?\b")).unwrap());

/// Strip trailing punctuation and unbalanced closing brackets from a DOI.
fn clean_doi(doi: &str) -> String {
    let mut doi = doi.trim_end_matches(['.', ',', ';', ':']);

    for (open, close) in [('(', ')'), ('[', ']'), ('{', '}')] {
        while doi.ends_with(close) && doi.matches(close).count() > doi.matches(open).count() {
            doi = &doi[..doi.len() - 1];
            doi = doi.trim_end_matches(['.', ',', ';', ':']);
        }
    }

    doi.to_string()
}

/// Extract the first DOI from reference text.
///
/// Handles bare DOIs as well as `doi:` and `https://doi.org/` prefixes, since
/// the pattern only anchors on the `10.NNNN/` registrant prefix.
pub fn extract_doi(text: &str) -> Option<String> {
    static DOI_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"10\.\d{4,9}/[^\s"<>]+"#).unwrap());

    DOI_RE
        .find(text)
        .map(|m| clean_doi(m.as_str()))
        .filter(|d| d.contains('/') && !d.ends_with('/'))
}

/// Whether `text` contains a plausible publication year.
pub fn has_year(text: &str) -> bool {
    ANY_YEAR_RE.is_match(text)
}

/// A located publication year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearToken {
    /// The four digits, without suffix.
    pub year: String,
    /// Byte offset where the token (including brackets/punctuation) starts.
    pub start: usize,
    /// Byte offset just past the token.
    pub end: usize,
}

/// Locate the publication year of a reference.
///
/// Preference order: a parenthesized year `(2020)`, then a year after a comma
/// and followed by a period `, 2020.`, then any year token.
pub fn extract_year(text: &str) -> Option<YearToken> {
    static PAREN_YEAR_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"\(({YEAR})[a-z]?\)")).unwrap());
    static COMMA_YEAR_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r",\s*({YEAR})[a-z]?\.")).unwrap());

    [&*PAREN_YEAR_RE, &*COMMA_YEAR_RE, &*ANY_YEAR_RE]
        .into_iter()
        .find_map(|re| {
            let caps = re.captures(text)?;
            let whole = caps.get(0)?;
            Some(YearToken {
                year: caps.get(1)?.as_str().to_string(),
                start: whole.start(),
                end: whole.end(),
            })
        })
}

/// An explicit citation marker at the start of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub number: usize,
    /// Byte offset just past the marker and any following whitespace.
    pub end: usize,
}

/// Parse a leading `[n]`, `(n)` or `n.` marker.
pub fn extract_marker(text: &str) -> Option<Marker> {
    static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^\s*(?:\[(\d{1,3})\]|\((\d{1,3})\)|(\d{1,3})\.(?:\s|$))\s*").unwrap()
    });

    let caps = MARKER_RE.captures(text)?;
    let number = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))?
        .as_str()
        .parse()
        .ok()?;
    Some(Marker {
        number,
        end: caps.get(0)?.end(),
    })
}

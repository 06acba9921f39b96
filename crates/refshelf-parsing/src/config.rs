use refshelf_core::config_file::ExtractionConfig;
use regex::Regex;

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

/// Bibliography header terms recognised by default (matched case-insensitively).
pub const DEFAULT_SECTION_HEADERS: &[&str] = &[
    "references",
    "bibliography",
    "works cited",
    "literature cited",
    "citations",
    "参考文献",
    "引用文献",
    "文献",
];

/// Configuration for the reference extraction pipeline.
///
/// Regex fields are `Option<Regex>`; `None` means "use the built-in default".
/// Use [`ParsingConfigBuilder`] to construct with string patterns.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    // ── section.rs ──
    /// Regex a line-like segment must match at its start to count as a header.
    pub(crate) section_header_re: Option<Regex>,
    /// Fraction of the document (from the end) searched by the fallback locators.
    pub(crate) tail_fraction: f64,
    /// Where the references region starts when nothing was found (0.0–1.0).
    pub(crate) cutoff_fraction: f64,
    /// Matches needed to accept a dense author-year run.
    pub(crate) dense_run_min: usize,
    /// Maximum gap, in bytes, between consecutive matches of a dense run.
    pub(crate) dense_run_max_gap: usize,

    // ── segment.rs ──
    /// Regex for marker-based segmentation: `[n]`, `n.`, `(n)`.
    pub(crate) numbered_segment_re: Option<Regex>,
    /// Segments a strategy must yield to win.
    pub(crate) min_segments: usize,
    pub(crate) min_reference_chars: usize,
    pub(crate) max_reference_chars: usize,

    // ── extractor.rs ──
    /// Fewer references than this marks the extraction as incomplete.
    pub(crate) incomplete_threshold: usize,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            section_header_re: None,
            tail_fraction: 0.15,
            cutoff_fraction: 0.9,
            dense_run_min: 5,
            dense_run_max_gap: 300,
            numbered_segment_re: None,
            min_segments: 3,
            min_reference_chars: 20,
            max_reference_chars: 1000,
            incomplete_threshold: 5,
        }
    }
}

impl ParsingConfig {
    pub fn cutoff_fraction(&self) -> f64 {
        self.cutoff_fraction
    }

    pub fn incomplete_threshold(&self) -> usize {
        self.incomplete_threshold
    }
}

/// Build the header regex for a list of header terms.
///
/// A segment matches when it starts with the term, optionally preceded by a
/// section number ("7", "7.1", "VII") and followed by a colon. The term must
/// end the segment or be followed by the first entry (`[`, `(`, a digit or a
/// capital letter). The `header` group spans the term and its colon.
pub fn header_regex(terms: &[String]) -> Result<Regex, regex::Error> {
    let alternatives = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"(?i)^(?:(?:\d+(?:\.\d+)*|[IVX]+)\.?\s+)?(?P<header>(?:{alternatives})\s*:?)(?:$|\s*[\[(]|\s+(?-i:[\d\p{{Lu}}]))"
    ))
}

/// Builder for [`ParsingConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast with `regex::Error` if any pattern is invalid.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    section_header_re: Option<String>,
    section_headers: ListOverride<String>,
    tail_fraction: Option<f64>,
    cutoff_fraction: Option<f64>,
    dense_run_min: Option<usize>,
    dense_run_max_gap: Option<usize>,
    numbered_segment_re: Option<String>,
    min_segments: Option<usize>,
    min_reference_chars: Option<usize>,
    max_reference_chars: Option<usize>,
    incomplete_threshold: Option<usize>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Section header ──

    /// Replace the header regex entirely. Takes precedence over header terms.
    pub fn section_header_regex(mut self, pattern: &str) -> Self {
        self.section_header_re = Some(pattern.to_string());
        self
    }

    pub fn set_section_headers(mut self, headers: Vec<String>) -> Self {
        self.section_headers = ListOverride::Replace(headers);
        self
    }

    pub fn add_section_header(mut self, header: String) -> Self {
        match &mut self.section_headers {
            ListOverride::Extend(v) => v.push(header),
            _ => self.section_headers = ListOverride::Extend(vec![header]),
        }
        self
    }

    // ── Fallback locators ──

    pub fn tail_fraction(mut self, fraction: f64) -> Self {
        self.tail_fraction = Some(fraction);
        self
    }

    pub fn cutoff_fraction(mut self, fraction: f64) -> Self {
        self.cutoff_fraction = Some(fraction);
        self
    }

    pub fn dense_run(mut self, min_matches: usize, max_gap: usize) -> Self {
        self.dense_run_min = Some(min_matches);
        self.dense_run_max_gap = Some(max_gap);
        self
    }

    // ── Segmentation ──

    pub fn numbered_segment_regex(mut self, pattern: &str) -> Self {
        self.numbered_segment_re = Some(pattern.to_string());
        self
    }

    pub fn min_segments(mut self, n: usize) -> Self {
        self.min_segments = Some(n);
        self
    }

    pub fn reference_length(mut self, min_chars: usize, max_chars: usize) -> Self {
        self.min_reference_chars = Some(min_chars);
        self.max_reference_chars = Some(max_chars);
        self
    }

    pub fn incomplete_threshold(mut self, n: usize) -> Self {
        self.incomplete_threshold = Some(n);
        self
    }

    /// Apply the `[extraction]` table of a config file. Fields left unset in
    /// the file keep their current builder values.
    pub fn apply_file_config(mut self, file: &ExtractionConfig) -> Self {
        if let Some(n) = file.incomplete_threshold {
            self = self.incomplete_threshold(n);
        }
        if let Some(f) = file.tail_fraction {
            self = self.tail_fraction(f);
        }
        if let Some(f) = file.cutoff_fraction {
            self = self.cutoff_fraction(f);
        }
        if let Some(n) = file.min_segments {
            self = self.min_segments(n);
        }
        for header in file.extra_headers.iter().flatten() {
            self = self.add_section_header(header.clone());
        }
        self
    }

    /// Compile all string patterns into regexes and produce a [`ParsingConfig`].
    pub fn build(self) -> Result<ParsingConfig, regex::Error> {
        let compile = |opt: Option<String>| -> Result<Option<Regex>, regex::Error> {
            opt.map(|p| Regex::new(&p)).transpose()
        };

        let section_header_re = match (self.section_header_re, &self.section_headers) {
            (Some(pattern), _) => Some(Regex::new(&pattern)?),
            (None, ListOverride::Default) => None,
            (None, headers) => {
                let defaults: Vec<String> =
                    DEFAULT_SECTION_HEADERS.iter().map(|s| s.to_string()).collect();
                Some(header_regex(&headers.resolve(&defaults))?)
            }
        };

        let defaults = ParsingConfig::default();
        Ok(ParsingConfig {
            section_header_re,
            tail_fraction: self
                .tail_fraction
                .unwrap_or(defaults.tail_fraction)
                .clamp(0.0, 1.0),
            cutoff_fraction: self
                .cutoff_fraction
                .unwrap_or(defaults.cutoff_fraction)
                .clamp(0.0, 1.0),
            dense_run_min: self.dense_run_min.unwrap_or(defaults.dense_run_min).max(1),
            dense_run_max_gap: self.dense_run_max_gap.unwrap_or(defaults.dense_run_max_gap),
            numbered_segment_re: compile(self.numbered_segment_re)?,
            min_segments: self.min_segments.unwrap_or(defaults.min_segments),
            min_reference_chars: self
                .min_reference_chars
                .unwrap_or(defaults.min_reference_chars),
            max_reference_chars: self
                .max_reference_chars
                .unwrap_or(defaults.max_reference_chars),
            incomplete_threshold: self
                .incomplete_threshold
                .unwrap_or(defaults.incomplete_threshold),
        })
    }
}

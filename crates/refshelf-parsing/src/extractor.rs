use std::path::Path;

use refshelf_core::{MAX_TEXT_CHARS, PageTextBackend, ParsedReference, truncate_chars};

use crate::config::ParsingConfig;
use crate::section::{self, SectionStart};
use crate::segment::{self, SegmentationResult, SegmentationStrategy};
use crate::text_processing::{collapse_whitespace, normalize_page, normalize_pages};
use crate::{ParsingError, fields, identifiers};

/// A configurable reference extraction pipeline.
///
/// Holds a [`ParsingConfig`] and exposes each pipeline step as a method.
/// The default constructor uses built-in defaults; use
/// [`ReferenceExtractor::with_config`] to supply custom patterns and
/// thresholds.
#[derive(Debug, Clone, Default)]
pub struct ReferenceExtractor {
    config: ParsingConfig,
}

/// Counters for segments that did not become references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipStats {
    /// Segments produced by the segmenter, before validation.
    pub total_raw: usize,
    pub too_short: usize,
    pub too_long: usize,
    pub no_year: usize,
}

/// Reason a segment was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TooShort,
    TooLong,
    NoYear,
}

/// Output of a full extraction run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    /// References in source appearance order.
    pub references: Vec<ParsedReference>,
    /// Where the references region was taken from.
    pub section: SectionStart,
    /// Segmentation strategy used, `None` when the region was one segment.
    pub strategy: Option<SegmentationStrategy>,
    pub skip_stats: SkipStats,
}

impl ExtractionResult {
    fn empty() -> Self {
        Self {
            references: Vec::new(),
            section: SectionStart::TailCutoff,
            strategy: None,
            skip_stats: SkipStats::default(),
        }
    }

    /// Whether the list looks truncated; see [`is_incomplete`].
    pub fn is_incomplete(&self, threshold: usize) -> bool {
        is_incomplete(&self.references, threshold)
    }
}

/// Fewer than `threshold` references suggests extraction missed most of the
/// bibliography, and an alternate source (e.g. an LLM pass) is worth trying.
pub fn is_incomplete(references: &[ParsedReference], threshold: usize) -> bool {
    references.len() < threshold
}

impl ReferenceExtractor {
    /// Create an extractor with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with a custom configuration.
    pub fn with_config(config: ParsingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    /// Locate the references section and return the region after it (step 1).
    pub fn locate<'a>(&self, text: &'a str) -> (SectionStart, &'a str) {
        let start = section::locate_references_with_config(text, &self.config);
        let offset = start.offset_in(text, self.config.cutoff_fraction);
        (start, &text[offset..])
    }

    /// Split a references region into raw segments (step 2).
    pub fn segment(&self, region: &str) -> SegmentationResult {
        segment::segment_references_with_config(region, &self.config)
    }

    /// Validate one segment and extract its fields (step 3).
    ///
    /// `next_index` is used when the segment carries no explicit marker.
    pub fn parse_segment(
        &self,
        raw: &str,
        next_index: usize,
    ) -> Result<ParsedReference, SkipReason> {
        let text = collapse_whitespace(raw);
        self.check_length(&text)?;
        let year = identifiers::extract_year(&text).ok_or(SkipReason::NoYear)?;

        let marker = identifiers::extract_marker(&text).filter(|m| m.number > 0);
        let marker_end = marker.map(|m| m.end).unwrap_or(0);

        Ok(ParsedReference {
            index: marker.map(|m| m.number).unwrap_or(next_index),
            doi: identifiers::extract_doi(&text),
            authors: fields::extract_authors(&text, &year, marker_end),
            title: fields::extract_title(&text, &year),
            year: Some(year.year),
            text: truncate_chars(&text, MAX_TEXT_CHARS),
        }
        .sanitize())
    }

    /// Validate a record produced outside the pipeline, such as one returned
    /// by an LLM, against the same rules as [`parse_segment`](Self::parse_segment).
    ///
    /// The text must fall within the configured length bounds. The year is
    /// taken from the record's own `year` field when it holds a year token,
    /// else from the text, and is stored as the bare four digits.
    pub fn validate_record(
        &self,
        record: ParsedReference,
    ) -> Result<ParsedReference, SkipReason> {
        let text = collapse_whitespace(&record.text);
        self.check_length(&text)?;
        let year = record
            .year
            .as_deref()
            .and_then(identifiers::extract_year)
            .or_else(|| identifiers::extract_year(&text))
            .ok_or(SkipReason::NoYear)?;

        Ok(ParsedReference {
            year: Some(year.year),
            text: truncate_chars(&text, MAX_TEXT_CHARS),
            ..record
        }
        .sanitize())
    }

    fn check_length(&self, text: &str) -> Result<(), SkipReason> {
        let len = text.chars().count();
        if len < self.config.min_reference_chars {
            return Err(SkipReason::TooShort);
        }
        if len > self.config.max_reference_chars {
            return Err(SkipReason::TooLong);
        }
        Ok(())
    }

    /// Run the pipeline on per-page text.
    pub fn extract_from_pages<S: AsRef<str>>(&self, pages: &[S]) -> ExtractionResult {
        self.extract_normalized(&normalize_pages(pages))
    }

    /// Run the pipeline on already-joined document text.
    pub fn extract_from_text(&self, text: &str) -> ExtractionResult {
        self.extract_normalized(&normalize_page(text))
    }

    /// Read a document's pages through `backend` and run the pipeline.
    pub fn extract_from_document(
        &self,
        path: &Path,
        backend: &dyn PageTextBackend,
    ) -> Result<ExtractionResult, ParsingError> {
        let pages = backend.page_texts(path)?;
        tracing::debug!(path = %path.display(), pages = pages.len(), "read page text");
        Ok(self.extract_from_pages(&pages))
    }

    fn extract_normalized(&self, text: &str) -> ExtractionResult {
        if text.trim().is_empty() {
            return ExtractionResult::empty();
        }

        let (section, region) = self.locate(text);
        let SegmentationResult { strategy, segments } = self.segment(region);

        let mut stats = SkipStats {
            total_raw: segments.len(),
            ..Default::default()
        };
        let mut references: Vec<ParsedReference> = Vec::new();

        for raw in &segments {
            match self.parse_segment(raw, references.len() + 1) {
                Ok(r) => references.push(r),
                Err(reason) => match reason {
                    SkipReason::TooShort => stats.too_short += 1,
                    SkipReason::TooLong => stats.too_long += 1,
                    SkipReason::NoYear => stats.no_year += 1,
                },
            }
        }

        tracing::debug!(
            found_by = ?section.found_by(),
            ?strategy,
            accepted = references.len(),
            too_short = stats.too_short,
            too_long = stats.too_long,
            no_year = stats.no_year,
            "extracted references"
        );

        ExtractionResult {
            references,
            section,
            strategy,
            skip_stats: stats,
        }
    }
}

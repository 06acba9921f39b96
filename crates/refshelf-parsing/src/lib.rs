use std::path::Path;

use thiserror::Error;

pub mod config;
pub mod extractor;
pub mod fields;
pub mod identifiers;
pub mod section;
pub mod segment;
pub mod strategy;
pub mod text_processing;

pub use config::{ListOverride, ParsingConfig, ParsingConfigBuilder};
pub use extractor::{ExtractionResult, ReferenceExtractor, SkipReason, SkipStats, is_incomplete};
pub use section::{LocatorStrategy, SectionStart, locate_references};
pub use segment::{SegmentationResult, SegmentationStrategy, segment_references};
pub use strategy::first_success;
pub use text_processing::normalize_pages;
// Re-export domain types from core (canonical definitions live there)
pub use refshelf_core::{BackendError, PageTextBackend, ParsedReference};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Extract references from a document using the given backend for page text.
///
/// Pipeline:
/// 1. Read per-page text via `backend` and normalize it
/// 2. Locate the references section (header, numbered opener, dense
///    author-year run, or the tail cutoff)
/// 3. Segment individual references
/// 4. Validate each segment and extract index, DOI, year, title and authors
pub fn extract_references(
    path: &Path,
    backend: &dyn PageTextBackend,
) -> Result<ExtractionResult, ParsingError> {
    ReferenceExtractor::new().extract_from_document(path, backend)
}

use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open document: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of per-page document text.
///
/// Implementors own the PDF (or other format) decoding and return one UTF-8
/// string per page in reading order. Whitespace does not need to be
/// normalized; the parsing pipeline in `refshelf_parsing` does that.
pub trait PageTextBackend: Send + Sync {
    /// Extract the text of every page of the document at `path`.
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, BackendError>;
}

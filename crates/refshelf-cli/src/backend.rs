use std::path::Path;

use refshelf_core::{BackendError, PageTextBackend};

/// Reads page text that an external PDF tool already produced.
///
/// A `.json` file holds an array of page strings. Any other file is plain
/// text with pages separated by form feeds, the way `pdftotext` writes them.
pub struct FilePageBackend;

impl PageTextBackend for FilePageBackend {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, BackendError> {
        if !path.exists() {
            return Err(BackendError::OpenError(format!(
                "file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            return serde_json::from_str(&content)
                .map_err(|e| BackendError::ExtractionError(e.to_string()));
        }

        Ok(content.split('\u{000C}').map(str::to_string).collect())
    }
}

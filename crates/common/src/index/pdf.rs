//! PDF text extraction using lopdf.

use crate::errors::{AppError, Result};
use std::path::Path;
use tracing::{debug, warn};

/// Extract the text of every readable page, in page order
pub fn extract_text_from_pdf(path: &Path) -> Result<String> {
    let doc = lopdf::Document::load(path).map_err(|e| AppError::DocumentParse {
        path: path.display().to_string(),
        message: format!("Failed to load PDF: {}", e),
    })?;

    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    debug!(page_count = pages.len(), path = %path.display(), "Extracting text from PDF");

    let mut text = String::new();
    for page in pages {
        match doc.extract_text(&[page]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => {
                warn!(page, error = %e, "Failed to extract text from page, skipping");
            }
        }
    }

    let cleaned = clean_text(&text);
    if cleaned.is_empty() {
        return Err(AppError::DocumentParse {
            path: path.display().to_string(),
            message: "No text content extracted from PDF".to_string(),
        });
    }

    Ok(cleaned)
}

/// Collapse runs of blank lines and trailing spaces left by page extraction
fn clean_text(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        cleaned.push_str(line);
        cleaned.push('\n');
    }

    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_collapses_blank_lines() {
        let raw = "Zigbee mesh   \n\n\n\nThread border router\n";
        assert_eq!(clean_text(raw), "Zigbee mesh\n\nThread border router");
    }

    #[test]
    fn test_invalid_pdf_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let err = extract_text_from_pdf(&path).unwrap_err();
        assert!(matches!(err, AppError::DocumentParse { .. }));
    }
}

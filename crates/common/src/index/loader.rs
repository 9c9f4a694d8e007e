//! Document discovery and loading

use super::pdf::extract_text_from_pdf;
use crate::errors::{AppError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A loaded document ready for chunking
#[derive(Debug, Clone)]
pub struct Document {
    /// File name the text came from
    pub source: String,
    /// Extracted text
    pub text: String,
}

/// Whether a file name carries one of the eligible extensions
pub fn is_eligible(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// List eligible files directly inside `dir`, sorted by file name.
///
/// A missing directory is `DirectoryNotFound`; an existing directory with no
/// eligible files is an empty list.
pub async fn list_documents(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let is_dir = tokio::fs::metadata(dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(AppError::DirectoryNotFound {
            path: dir.display().to_string(),
        });
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_eligible(&path, extensions) {
            files.push(path);
        }
    }

    files.sort();
    debug!(dir = %dir.display(), count = files.len(), "Listed documents");
    Ok(files)
}

/// Read one document; PDFs go through text extraction
pub async fn load_document(path: &Path) -> Result<Document> {
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let is_pdf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    let text = if is_pdf {
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || extract_text_from_pdf(&owned))
            .await
            .map_err(|e| AppError::Internal {
                message: format!("PDF extraction task failed: {}", e),
            })??
    } else {
        let bytes = tokio::fs::read(path).await?;
        String::from_utf8(bytes).map_err(|e| AppError::DocumentParse {
            path: path.display().to_string(),
            message: format!("Not valid UTF-8: {}", e),
        })?
    };

    Ok(Document { source, text })
}

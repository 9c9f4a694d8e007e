//! Document management handlers

use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::AppState;
use iotrag_common::{
    errors::{AppError, Result},
    index::is_eligible,
    IndexOutcome,
};

#[derive(Debug, Default, Deserialize)]
pub struct ReloadRequest {
    /// Directory to index instead of the configured one; must lie inside it.
    /// Relative paths resolve against the documents directory.
    pub path: Option<String>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub status: String,
    pub filename: String,
    pub message: String,
    pub index: IndexOutcome,
}

/// Rebuild the semantic index from a directory
pub async fn reload(
    State(state): State<AppState>,
    request: Option<Json<ReloadRequest>>,
) -> Result<Json<IndexOutcome>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let path = match request.path {
        Some(requested) => resolve_within(Path::new(state.rag.docs_dir()), &requested).await?,
        None => PathBuf::from(state.rag.docs_dir()),
    };

    let outcome = state.rag.load_documents(&path).await?;
    tracing::info!(path = %path.display(), ?outcome, "Documents reloaded");
    Ok(Json(outcome))
}

/// Resolve `requested` against `docs_dir`, rejecting anything outside it
async fn resolve_within(docs_dir: &Path, requested: &str) -> Result<PathBuf> {
    let not_found = |path: &Path| AppError::DirectoryNotFound {
        path: path.display().to_string(),
    };

    let root = tokio::fs::canonicalize(docs_dir)
        .await
        .map_err(|_| not_found(docs_dir))?;
    let candidate = root.join(requested);
    let resolved = tokio::fs::canonicalize(&candidate)
        .await
        .map_err(|_| not_found(&candidate))?;

    if !resolved.starts_with(&root) {
        tracing::warn!(%requested, "Reload path outside the documents directory");
        return Err(AppError::validation(
            "path",
            "Reload path must be inside the documents directory",
        ));
    }
    Ok(resolved)
}

/// Store an uploaded document in the documents directory and reindex
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let limit = state.config.server.max_upload_bytes;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .and_then(|name| Path::new(name).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::validation("file", "Uploaded file has no name"))?;

        if !is_eligible(Path::new(&filename), &state.config.index.extensions) {
            return Err(AppError::validation(
                "file",
                format!(
                    "Only {} files are supported",
                    state
                        .config
                        .index
                        .extensions
                        .iter()
                        .map(|e| format!(".{}", e))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            ));
        }

        let bytes = read_limited(field, limit).await?;

        let docs_dir = PathBuf::from(state.rag.docs_dir());
        tokio::fs::create_dir_all(&docs_dir).await?;
        tokio::fs::write(docs_dir.join(&filename), &bytes).await?;
        tracing::info!(%filename, size = bytes.len(), "Document uploaded");

        let index = state.rag.load_documents(&docs_dir).await?;

        return Ok(Json(UploadResponse {
            status: "success".to_string(),
            filename,
            message: "Document uploaded and indexed successfully".to_string(),
            index,
        }));
    }

    Err(AppError::validation("file", "Missing multipart field 'file'"))
}

async fn read_limited(mut field: Field<'_>, limit: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge {
                size: bytes.len() + chunk.len(),
                limit,
            });
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::InvalidFormat {
        message: err.body_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subdirectory_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("archive")).unwrap();

        let resolved = resolve_within(dir.path(), "archive").await.unwrap();
        assert!(resolved.ends_with("archive"));
    }

    #[tokio::test]
    async fn test_paths_outside_docs_dir_rejected() {
        let outer = tempfile::tempdir().unwrap();
        let docs = outer.path().join("docs");
        std::fs::create_dir(&docs).unwrap();
        let other = tempfile::tempdir().unwrap();

        let escaped = resolve_within(&docs, "..").await.unwrap_err();
        assert!(matches!(escaped, AppError::Validation { .. }));

        let absolute = resolve_within(&docs, &other.path().display().to_string())
            .await
            .unwrap_err();
        assert!(matches!(absolute, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_missing_subdirectory_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_within(dir.path(), "missing").await.unwrap_err();
        assert!(matches!(err, AppError::DirectoryNotFound { .. }));
    }
}

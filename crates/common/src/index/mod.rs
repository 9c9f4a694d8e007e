//! Semantic index construction
//!
//! Builds a fresh vector store from a directory of documents:
//! - File discovery (`.txt`, `.md`, `.pdf` by default)
//! - Chunking via text-splitter
//! - Batched embedding
//! - In-memory cosine similarity search

mod chunker;
mod loader;
mod pdf;
mod store;

pub use chunker::{chunk_text, ChunkingConfig, TextChunk};
pub use loader::{is_eligible, list_documents, load_document, Document};
pub use store::{cosine_similarity, InMemoryVectorStore, IndexedChunk, ScoredChunk, VectorStore};

use crate::config::IndexConfig;
use crate::embeddings::Embedder;
use crate::errors::{AppError, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A freshly built, populated index
pub struct BuiltIndex {
    pub store: Arc<dyn VectorStore>,
    pub documents: usize,
    pub chunks: usize,
}

/// Stable chunk id derived from its source and position
pub fn chunk_id(source: &str, index: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(index.to_le_bytes());
    hex::encode(hasher.finalize())
}

/// Builds indexes from document directories
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    chunking: ChunkingConfig,
    extensions: Vec<String>,
    batch_size: usize,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn Embedder>, config: &IndexConfig, batch_size: usize) -> Self {
        Self {
            embedder,
            chunking: ChunkingConfig {
                chunk_size: config.chunk_size,
                min_chunk_size: config.min_chunk_size,
            },
            extensions: config.extensions.clone(),
            batch_size: batch_size.max(1),
        }
    }

    /// Build a new index from every eligible file in `dir`.
    ///
    /// Returns `Ok(None)` when the directory holds no usable text.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub async fn build(&self, dir: &Path) -> Result<Option<BuiltIndex>> {
        let files = list_documents(dir, &self.extensions).await?;
        if files.is_empty() {
            return Ok(None);
        }
        info!(count = files.len(), "Found document(s)");

        let mut documents = Vec::with_capacity(files.len());
        for path in &files {
            match load_document(path).await {
                Ok(doc) if !doc.text.trim().is_empty() => documents.push(doc),
                Ok(_) => warn!(path = %path.display(), "Document is empty, skipping"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to load document, skipping"),
            }
        }
        if documents.is_empty() {
            return Ok(None);
        }

        let mut pending: Vec<(String, String, String)> = Vec::new();
        for doc in &documents {
            for chunk in chunk_text(&doc.text, &self.chunking) {
                pending.push((chunk_id(&doc.source, chunk.index), doc.source.clone(), chunk.content));
            }
        }

        let store = InMemoryVectorStore::new();
        for batch in pending.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|(_, _, text)| text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(AppError::EmbeddingError {
                    message: format!(
                        "{} returned {} embeddings for {} chunks",
                        self.embedder.model_name(),
                        embeddings.len(),
                        batch.len()
                    ),
                });
            }

            let indexed = batch
                .iter()
                .cloned()
                .zip(embeddings)
                .map(|((id, source, text), embedding)| IndexedChunk {
                    id,
                    source,
                    text,
                    embedding,
                })
                .collect();
            store.upsert(indexed).await?;
        }

        let chunks = store.len().await;
        info!(documents = documents.len(), chunks, "Index built");

        Ok(Some(BuiltIndex {
            store: Arc::new(store),
            documents: documents.len(),
            chunks,
        }))
    }
}

//! Document chunking
//!
//! Chunks are the unit of retrieval: each one is embedded and scored on its own.

use text_splitter::{ChunkConfig, TextSplitter};
use tracing::debug;

/// Chunk size bounds, in characters
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    /// Minimum chunk size; smaller chunks are dropped unless they are the only one
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            min_chunk_size: 32,
        }
    }
}

/// One span of a document
#[derive(Debug, Clone)]
pub struct TextChunk {
    pub content: String,
    /// Position among the kept chunks of the document
    pub index: usize,
    /// Rough estimate, four bytes per token
    pub token_count: usize,
    /// Byte range in the source text
    pub start_pos: usize,
    pub end_pos: usize,
}

/// Split text on semantic boundaries; a document's only chunk is always kept
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<TextChunk> {
    let splitter = TextSplitter::new(ChunkConfig::new(config.chunk_size.max(1)));

    let chunks: Vec<&str> = splitter.chunks(text).collect();
    let sole_chunk = chunks.len() == 1;

    debug!(
        input_len = text.len(),
        chunk_count = chunks.len(),
        chunk_size = config.chunk_size,
        "Text chunked"
    );

    let mut result = Vec::with_capacity(chunks.len());
    let mut pos = 0;

    for chunk in chunks {
        let start_pos = text[pos..].find(chunk).map(|p| pos + p).unwrap_or(pos);
        let end_pos = start_pos + chunk.len();
        pos = end_pos;

        if !sole_chunk && chunk.chars().count() < config.min_chunk_size {
            continue;
        }

        result.push(TextChunk {
            content: chunk.to_string(),
            index: result.len(),
            token_count: chunk.len() / 4,
            start_pos,
            end_pos,
        });
    }

    result
}

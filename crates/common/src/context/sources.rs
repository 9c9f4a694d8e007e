//! Retrieval results and source provenance

use super::history::truncate_chars;
use crate::index::ScoredChunk;
use serde::{Deserialize, Serialize};

/// Characters of a chunk shown as a source preview
pub const SOURCE_PREVIEW_CHARS: usize = 200;

/// Appended to previews that were cut
pub const ELLIPSIS: &str = "...";

/// One retrieved passage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceNode {
    pub text: String,
    pub score: f32,
}

impl SourceNode {
    /// Preview of a chunk; the score passes through untouched
    pub fn from_chunk(text: &str, score: f32) -> Self {
        let preview = truncate_chars(text, SOURCE_PREVIEW_CHARS);
        let text = if preview.len() < text.len() {
            format!("{}{}", preview, ELLIPSIS)
        } else {
            text.to_string()
        };
        Self { text, score }
    }
}

impl From<&ScoredChunk> for SourceNode {
    fn from(chunk: &ScoredChunk) -> Self {
        Self::from_chunk(&chunk.text, chunk.score)
    }
}

/// Answer plus the passages it was generated from, in index ranking order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub response: String,
    pub sources: Vec<SourceNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_verbatim() {
        let node = SourceNode::from_chunk("MQTT is a lightweight protocol.", 0.82);
        assert_eq!(node.text, "MQTT is a lightweight protocol.");
        assert_eq!(node.score, 0.82);
    }

    #[test]
    fn test_exactly_limit_is_not_truncated() {
        let text = "x".repeat(SOURCE_PREVIEW_CHARS);
        let node = SourceNode::from_chunk(&text, 0.5);
        assert_eq!(node.text, text);
    }

    #[test]
    fn test_long_text_truncated_with_ellipsis() {
        let text = "a".repeat(SOURCE_PREVIEW_CHARS) + "tail";
        let node = SourceNode::from_chunk(&text, 0.1);
        assert_eq!(node.text, format!("{}...", "a".repeat(SOURCE_PREVIEW_CHARS)));
        assert!(node.text.chars().count() <= SOURCE_PREVIEW_CHARS + ELLIPSIS.len());
    }

    #[test]
    fn test_multibyte_truncation() {
        let text = "ü".repeat(300);
        let node = SourceNode::from_chunk(&text, 0.3);
        assert_eq!(node.text.chars().count(), SOURCE_PREVIEW_CHARS + 3);
        assert!(node.text.ends_with(ELLIPSIS));
    }
}

//! Vector storage for document chunks

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A chunk with its embedding
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    /// Stable id: sha256 of source and chunk index
    pub id: String,
    pub source: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A chunk returned by a nearest-neighbor query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub source: String,
    pub text: String,
    /// Cosine similarity, higher is more relevant
    pub score: f32,
}

/// Nearest-neighbor storage for chunk embeddings
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace chunks by id
    async fn upsert(&self, chunks: Vec<IndexedChunk>) -> Result<()>;

    /// Up to `k` chunks ordered by descending similarity
    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    /// Number of stored chunks
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Cosine similarity in [-1.0, 1.0]; zero vectors score 0.0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[derive(Default)]
struct Chunks {
    // Insertion order, which breaks score ties
    ordered: Vec<IndexedChunk>,
    positions: HashMap<String, usize>,
}

/// Brute-force in-memory vector store
#[derive(Default)]
pub struct InMemoryVectorStore {
    chunks: RwLock<Chunks>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, chunks: Vec<IndexedChunk>) -> Result<()> {
        let mut stored = self.chunks.write().await;

        if let (Some(first), Some(new)) = (stored.ordered.first(), chunks.first()) {
            if first.embedding.len() != new.embedding.len() {
                return Err(AppError::Internal {
                    message: format!(
                        "Embedding dimension mismatch: index has {}, got {}",
                        first.embedding.len(),
                        new.embedding.len()
                    ),
                });
            }
        }

        let Chunks { ordered, positions } = &mut *stored;
        for chunk in chunks {
            match positions.get(&chunk.id) {
                Some(&pos) => ordered[pos] = chunk,
                None => {
                    positions.insert(chunk.id.clone(), ordered.len());
                    ordered.push(chunk);
                }
            }
        }
        Ok(())
    }

    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let stored = self.chunks.read().await;

        let mut scored: Vec<ScoredChunk> = stored
            .ordered
            .iter()
            .map(|c| ScoredChunk {
                source: c.source.clone(),
                text: c.text.clone(),
                score: cosine_similarity(query, &c.embedding),
            })
            .collect();

        // Stable sort: equal scores keep insertion order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    async fn len(&self) -> usize {
        self.chunks.read().await.ordered.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, text: &str, embedding: Vec<f32>) -> IndexedChunk {
        IndexedChunk {
            id: id.to_string(),
            source: "test.txt".to_string(),
            text: text.to_string(),
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_nearest_orders_by_score_and_caps_k() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                chunk("a", "far", vec![0.0, 1.0]),
                chunk("b", "near", vec![1.0, 0.1]),
                chunk("c", "middle", vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        let results = store.nearest(&[1.0, 0.0], 2).await.unwrap();
        let texts: Vec<_> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["near", "middle"]);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let store = InMemoryVectorStore::new();
        store.upsert(vec![chunk("a", "old", vec![1.0])]).await.unwrap();
        store.upsert(vec![chunk("a", "new", vec![1.0])]).await.unwrap();

        assert_eq!(store.len().await, 1);
        let results = store.nearest(&[1.0], 5).await.unwrap();
        assert_eq!(results[0].text, "new");
    }

    #[tokio::test]
    async fn test_replacement_keeps_insertion_position() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                chunk("a", "first", vec![1.0, 0.0]),
                chunk("b", "second", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();
        store
            .upsert(vec![chunk("a", "first again", vec![1.0, 0.0])])
            .await
            .unwrap();

        let results = store.nearest(&[1.0, 0.0], 5).await.unwrap();
        let texts: Vec<_> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["first again", "second"]);
    }

    #[tokio::test]
    async fn test_large_upsert_stays_linear() {
        let store = InMemoryVectorStore::new();
        for batch in 0..500 {
            let chunks = (0..40)
                .map(|i| chunk(&format!("{}-{}", batch, i), "t", vec![1.0, 0.0]))
                .collect();
            store.upsert(chunks).await.unwrap();
        }
        assert_eq!(store.len().await, 20_000);

        let start = std::time::Instant::now();
        let replacements = (0..20_000)
            .map(|n| chunk(&format!("{}-{}", n / 40, n % 40), "u", vec![0.0, 1.0]))
            .collect();
        store.upsert(replacements).await.unwrap();
        assert_eq!(store.len().await, 20_000);
        assert!(start.elapsed() < std::time::Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let store = InMemoryVectorStore::new();
        store.upsert(vec![chunk("a", "x", vec![1.0, 0.0])]).await.unwrap();
        let err = store.upsert(vec![chunk("b", "y", vec![1.0])]).await;
        assert!(err.is_err());
    }
}

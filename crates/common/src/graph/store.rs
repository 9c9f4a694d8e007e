//! Graph store abstraction

use super::models::{Concept, RelatedConcept, Relationship};
use crate::errors::Result;
use async_trait::async_trait;

/// Persistence for concepts and relationships.
///
/// `neighbors` follows edges in both directions, excludes the start concept,
/// deduplicates by id and orders by hop distance, then id.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Trivial round trip proving the store answers
    async fn ping(&self) -> Result<()>;

    /// Insert or update a concept by id
    async fn upsert_concept(&self, concept: &Concept) -> Result<()>;

    /// Merge an edge by endpoints and type; both endpoints must exist
    async fn upsert_relationship(&self, relationship: &Relationship) -> Result<()>;

    async fn concept_exists(&self, id: &str) -> Result<bool>;

    /// Concepts 1..=`max_depth` hops from `id`, at most `limit` of them
    async fn neighbors(&self, id: &str, max_depth: usize, limit: usize) -> Result<Vec<RelatedConcept>>;

    /// Backend label for logs
    fn backend(&self) -> &'static str;
}

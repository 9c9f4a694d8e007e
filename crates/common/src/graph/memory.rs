//! In-memory concept graph

use super::models::{Concept, RelatedConcept, Relationship};
use super::store::GraphStore;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::RwLock;

#[derive(Default)]
struct GraphData {
    concepts: HashMap<String, Concept>,
    /// (source, type, target) -> edge
    edges: HashMap<(String, String, String), Relationship>,
    /// concept id -> ids connected in either direction
    adjacency: HashMap<String, HashSet<String>>,
}

/// Graph store backed by adjacency maps
#[derive(Default)]
pub struct InMemoryGraphStore {
    data: RwLock<GraphData>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn concept_count(&self) -> usize {
        self.data.read().await.concepts.len()
    }

    pub async fn relationship_count(&self) -> usize {
        self.data.read().await.edges.len()
    }

    pub async fn get_concept(&self, id: &str) -> Option<Concept> {
        self.data.read().await.concepts.get(id).cloned()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert_concept(&self, concept: &Concept) -> Result<()> {
        let mut data = self.data.write().await;
        data.concepts.insert(concept.id.clone(), concept.clone());
        Ok(())
    }

    async fn upsert_relationship(&self, relationship: &Relationship) -> Result<()> {
        relationship.validate()?;

        let mut data = self.data.write().await;
        for id in [&relationship.source_id, &relationship.target_id] {
            if !data.concepts.contains_key(id) {
                return Err(AppError::NotFound {
                    resource_type: "concept".to_string(),
                    id: id.clone(),
                });
            }
        }

        let key = (
            relationship.source_id.clone(),
            relationship.relationship_type.clone(),
            relationship.target_id.clone(),
        );
        data.edges.insert(key, relationship.clone());

        data.adjacency
            .entry(relationship.source_id.clone())
            .or_default()
            .insert(relationship.target_id.clone());
        data.adjacency
            .entry(relationship.target_id.clone())
            .or_default()
            .insert(relationship.source_id.clone());
        Ok(())
    }

    async fn concept_exists(&self, id: &str) -> Result<bool> {
        Ok(self.data.read().await.concepts.contains_key(id))
    }

    async fn neighbors(&self, id: &str, max_depth: usize, limit: usize) -> Result<Vec<RelatedConcept>> {
        let data = self.data.read().await;
        if !data.concepts.contains_key(id) {
            return Ok(Vec::new());
        }

        // Breadth-first, so the first visit of a node is its shortest hop count
        let mut visited: HashSet<&str> = HashSet::from([id]);
        let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(id, 0)]);
        let mut found: Vec<(usize, &str)> = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            if depth == max_depth {
                continue;
            }
            let Some(adjacent) = data.adjacency.get(current) else {
                continue;
            };
            for next in adjacent {
                if visited.insert(next.as_str()) {
                    found.push((depth + 1, next.as_str()));
                    queue.push_back((next.as_str(), depth + 1));
                }
            }
        }

        found.sort();
        Ok(found
            .into_iter()
            .filter_map(|(_, id)| data.concepts.get(id))
            .take(limit)
            .map(RelatedConcept::from)
            .collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

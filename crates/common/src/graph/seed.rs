//! Starter IoT concept graph

use super::models::{Concept, ConceptType, Relationship};
use super::store::GraphStore;
use serde::Serialize;
use tracing::{error, info};

/// Outcome of a seeding run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub concepts_written: usize,
    pub relationships_written: usize,
    pub failures: usize,
}

impl SeedReport {
    pub fn is_complete(&self) -> bool {
        self.failures == 0
    }
}

pub fn sample_concepts() -> Vec<Concept> {
    vec![
        Concept::new("mqtt", "MQTT", ConceptType::Protocol)
            .with_description("Lightweight publish-subscribe protocol for IoT"),
        Concept::new("coap", "CoAP", ConceptType::Protocol)
            .with_description("Constrained Application Protocol for resource-limited devices"),
        Concept::new("http", "HTTP/HTTPS", ConceptType::Protocol)
            .with_description("Traditional web protocols adapted for IoT"),
        Concept::new("lorawan", "LoRaWAN", ConceptType::Protocol)
            .with_description("Long-range, low-power protocol for IoT networks"),
        Concept::new("edge_computing", "Edge Computing", ConceptType::Technology)
            .with_description("Processing data near the source rather than in cloud"),
        Concept::new("smart_home", "Smart Home", ConceptType::UseCase)
            .with_description("Home automation using IoT devices"),
        Concept::new("iiot", "Industrial IoT", ConceptType::UseCase)
            .with_description("IoT applications in manufacturing and industry"),
        Concept::new("encryption", "Encryption", ConceptType::SecurityPractice)
            .with_description("Encrypted communication channels for IoT"),
        Concept::new("authentication", "Authentication", ConceptType::SecurityPractice)
            .with_description("Device authentication and authorization"),
    ]
}

pub fn sample_relationships() -> Vec<Relationship> {
    vec![
        Relationship::new("mqtt", "USED_IN", "smart_home"),
        Relationship::new("coap", "ENABLES", "edge_computing"),
        Relationship::new("lorawan", "USED_IN", "iiot"),
        Relationship::new("encryption", "SECURES", "mqtt"),
        Relationship::new("authentication", "SECURES", "mqtt"),
        Relationship::new("edge_computing", "ENABLES", "iiot"),
        Relationship::new("http", "USED_IN", "smart_home"),
    ]
}

/// Upsert the starter graph. A failed write is counted and the rest still run.
pub async fn seed_graph(store: &dyn GraphStore) -> SeedReport {
    let mut report = SeedReport::default();

    for concept in sample_concepts() {
        match store.upsert_concept(&concept).await {
            Ok(()) => report.concepts_written += 1,
            Err(e) => {
                error!(concept = %concept.id, error = %e, "Failed to write concept");
                report.failures += 1;
            }
        }
    }

    for rel in sample_relationships() {
        match store.upsert_relationship(&rel).await {
            Ok(()) => report.relationships_written += 1,
            Err(e) => {
                error!(
                    source = %rel.source_id,
                    target = %rel.target_id,
                    relationship = %rel.relationship_type,
                    error = %e,
                    "Failed to write relationship"
                );
                report.failures += 1;
            }
        }
    }

    info!(
        concepts = report.concepts_written,
        relationships = report.relationships_written,
        failures = report.failures,
        "Sample graph seeded"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AppError, Result};
    use crate::graph::models::RelatedConcept;
    use crate::graph::InMemoryGraphStore;
    use async_trait::async_trait;

    #[tokio::test]
    async fn test_seed_writes_everything() {
        let store = InMemoryGraphStore::new();
        let report = seed_graph(&store).await;

        assert_eq!(report.concepts_written, 9);
        assert_eq!(report.relationships_written, 7);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_reseeding_is_idempotent() {
        let store = InMemoryGraphStore::new();
        seed_graph(&store).await;
        seed_graph(&store).await;

        assert_eq!(store.concept_count().await, 9);
        assert_eq!(store.relationship_count().await, 7);
    }

    /// Rejects writes touching one concept id
    struct FlakyStore {
        inner: InMemoryGraphStore,
        broken: &'static str,
    }

    #[async_trait]
    impl GraphStore for FlakyStore {
        async fn ping(&self) -> Result<()> {
            Ok(())
        }

        async fn upsert_concept(&self, concept: &Concept) -> Result<()> {
            if concept.id == self.broken {
                return Err(AppError::GraphError {
                    message: "write rejected".to_string(),
                });
            }
            self.inner.upsert_concept(concept).await
        }

        async fn upsert_relationship(&self, relationship: &Relationship) -> Result<()> {
            self.inner.upsert_relationship(relationship).await
        }

        async fn concept_exists(&self, id: &str) -> Result<bool> {
            self.inner.concept_exists(id).await
        }

        async fn neighbors(&self, id: &str, max_depth: usize, limit: usize) -> Result<Vec<RelatedConcept>> {
            self.inner.neighbors(id, max_depth, limit).await
        }

        fn backend(&self) -> &'static str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn test_failed_writes_do_not_stop_seeding() {
        let store = FlakyStore {
            inner: InMemoryGraphStore::new(),
            broken: "lorawan",
        };
        let report = seed_graph(&store).await;

        // lorawan itself and lorawan-USED_IN->iiot
        assert_eq!(report.failures, 2);
        assert_eq!(report.concepts_written, 8);
        assert_eq!(report.relationships_written, 6);
    }
}

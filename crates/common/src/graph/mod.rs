//! IoT concept graph
//!
//! Concepts (protocols, technologies, use cases, security practices) joined by
//! typed relationships, stored in Neo4j or in memory.

mod memory;
mod models;
mod neo4j;
mod seed;
mod service;
mod store;

pub use memory::InMemoryGraphStore;
pub use models::{validate_relationship_type, Concept, ConceptType, RelatedConcept, Relationship};
pub use neo4j::{http_base_url, Neo4jGraphStore, Statement};
pub use seed::{sample_concepts, sample_relationships, seed_graph, SeedReport};
pub use service::{create_graph_store, GraphService, NeighborLookup, MAX_RELATED_CONCEPTS};
pub use store::GraphStore;

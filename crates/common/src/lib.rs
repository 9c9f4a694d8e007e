//! IoT RAG Common Library
//!
//! Core of the IoT question-answering service:
//! - Context fusion engine (query enrichment, retrieval, generation)
//! - Semantic index over a documents directory
//! - IoT concept graph (Neo4j or in-memory)
//! - Embedding and generation client abstractions
//! - Error types, configuration, metrics and lifecycle tracking

pub mod config;
pub mod context;
pub mod embeddings;
pub mod errors;
pub mod graph;
pub mod index;
pub mod lifecycle;
pub mod llm;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use context::{ConversationMessage, IndexOutcome, RagService, SearchResult, SourceNode};
pub use embeddings::Embedder;
pub use errors::{AppError, Result};
pub use graph::{GraphService, NeighborLookup, RelatedConcept};
pub use lifecycle::{Readiness, SubsystemState};
pub use llm::Generator;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Snapshot of both subsystems
pub async fn readiness(rag: &RagService, graph: &GraphService) -> Readiness {
    Readiness {
        semantic_index_ready: rag.is_ready().await,
        graph_ready: graph.is_ready().await,
    }
}

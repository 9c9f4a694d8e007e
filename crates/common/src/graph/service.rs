//! Concept graph service

use super::memory::InMemoryGraphStore;
use super::models::{Concept, RelatedConcept, Relationship};
use super::neo4j::Neo4jGraphStore;
use super::seed::{seed_graph, SeedReport};
use super::store::GraphStore;
use crate::config::GraphConfig;
use crate::errors::{AppError, Result};
use crate::lifecycle::{Lifecycle, SubsystemState};
use crate::metrics;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

const SUBSYSTEM: &str = "graph";

/// Most related concepts returned by one lookup
pub const MAX_RELATED_CONCEPTS: usize = 20;

/// Outcome of a related-concept lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NeighborLookup {
    Found(Vec<RelatedConcept>),
    /// Unknown concept, or nothing within reach
    Empty,
    /// Graph not connected or the store failed
    Unavailable,
}

impl NeighborLookup {
    pub fn into_vec(self) -> Vec<RelatedConcept> {
        match self {
            NeighborLookup::Found(concepts) => concepts,
            NeighborLookup::Empty | NeighborLookup::Unavailable => Vec::new(),
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            NeighborLookup::Found(_) => "found",
            NeighborLookup::Empty => "empty",
            NeighborLookup::Unavailable => "unavailable",
        }
    }
}

/// Build the store named by `config.backend`
pub fn create_graph_store(config: &GraphConfig) -> Result<Arc<dyn GraphStore>> {
    match config.backend.as_str() {
        "neo4j" => Ok(Arc::new(Neo4jGraphStore::new(config)?)),
        "memory" => Ok(Arc::new(InMemoryGraphStore::new())),
        other => Err(AppError::Configuration {
            message: format!("Unknown graph backend: {}", other),
        }),
    }
}

/// Owns the graph store handle and its lifecycle
pub struct GraphService {
    config: GraphConfig,
    lifecycle: Lifecycle,
    store: RwLock<Option<Arc<dyn GraphStore>>>,
}

impl GraphService {
    pub fn new(config: &GraphConfig) -> Self {
        Self {
            config: config.clone(),
            lifecycle: Lifecycle::new(SUBSYSTEM),
            store: RwLock::new(None),
        }
    }

    pub async fn state(&self) -> SubsystemState {
        self.lifecycle.current().await
    }

    pub async fn is_ready(&self) -> bool {
        self.lifecycle.is_ready().await
    }

    /// Build the configured store and verify it with a round trip
    pub async fn connect(&self) -> Result<()> {
        self.lifecycle.transition(SubsystemState::Initializing).await;
        match create_graph_store(&self.config) {
            Ok(store) => self.attach(store).await,
            Err(e) => {
                error!(error = %e, "Failed to build graph store");
                self.lifecycle.fail(e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Use an already constructed store
    pub async fn connect_with(&self, store: Arc<dyn GraphStore>) -> Result<()> {
        self.lifecycle.transition(SubsystemState::Initializing).await;
        self.attach(store).await
    }

    async fn attach(&self, store: Arc<dyn GraphStore>) -> Result<()> {
        if let Err(e) = store.ping().await {
            error!(backend = store.backend(), error = %e, "Graph store unreachable");
            self.lifecycle.fail(e.to_string()).await;
            return Err(e);
        }

        info!(backend = store.backend(), "Connected to graph store");
        *self.store.write().await = Some(store);
        self.lifecycle.transition(SubsystemState::Ready).await;
        Ok(())
    }

    async fn ready_store(&self) -> Result<Arc<dyn GraphStore>> {
        if !self.is_ready().await {
            return Err(AppError::NotInitialized {
                subsystem: SUBSYSTEM.to_string(),
            });
        }
        self.store
            .read()
            .await
            .clone()
            .ok_or_else(|| AppError::NotInitialized {
                subsystem: SUBSYSTEM.to_string(),
            })
    }

    /// Raise to 1, lower to the configured ceiling
    pub fn clamp_depth(&self, requested: usize) -> usize {
        let ceiling = (self.config.max_traversal_depth as usize).max(1);
        if requested > ceiling {
            warn!(requested, ceiling, "Traversal depth clamped");
        }
        requested.clamp(1, ceiling)
    }

    /// Concepts within `max_depth` hops of `concept_id`, in either direction
    #[instrument(skip(self))]
    pub async fn get_related_concepts(&self, concept_id: &str, max_depth: usize) -> NeighborLookup {
        let start = Instant::now();
        let depth = self.clamp_depth(max_depth);

        let lookup = match self.ready_store().await {
            Err(_) => {
                warn!("Graph not ready, related concepts unavailable");
                NeighborLookup::Unavailable
            }
            Ok(store) => match store.neighbors(concept_id, depth, MAX_RELATED_CONCEPTS).await {
                Ok(related) if related.is_empty() => NeighborLookup::Empty,
                Ok(related) => NeighborLookup::Found(related),
                Err(e) => {
                    error!(error = %e, "Related concept lookup failed");
                    NeighborLookup::Unavailable
                }
            },
        };

        metrics::record_graph_query(start.elapsed().as_secs_f64(), lookup.outcome());
        lookup
    }

    pub async fn create_concept(&self, concept: &Concept) -> Result<()> {
        self.ready_store().await?.upsert_concept(concept).await
    }

    pub async fn create_relationship(&self, relationship: &Relationship) -> Result<()> {
        relationship.validate()?;
        self.ready_store()
            .await?
            .upsert_relationship(relationship)
            .await
    }

    /// Seed the starter IoT graph
    pub async fn initialize_sample_graph(&self) -> Result<SeedReport> {
        let store = self.ready_store().await?;
        Ok(seed_graph(store.as_ref()).await)
    }

    /// Drop the store handle
    pub async fn close(&self) {
        if self.store.write().await.take().is_some() {
            info!("Graph store closed");
        }
        self.lifecycle.transition(SubsystemState::Uninitialized).await;
    }
}

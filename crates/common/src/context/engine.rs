//! Context fusion engine
//!
//! `RagService` owns the semantic subsystem: the embedding and generation
//! clients, the lifecycle cell and the active `QueryEngine`. The engine is
//! held as an `Arc` snapshot; a rebuild constructs a fresh one and swaps it
//! in, while requests already running finish against the snapshot they took.

use super::history::{enrich_query, ConversationMessage};
use super::prompt::build_prompt;
use super::sources::{SearchResult, SourceNode};
use crate::config::{AppConfig, EmbeddingConfig, IndexConfig, LlmConfig};
use crate::embeddings::{create_embedder, Embedder};
use crate::errors::{error_chain, AppError, Result};
use crate::index::{IndexBuilder, VectorStore};
use crate::lifecycle::{Lifecycle, SubsystemState};
use crate::llm::{create_generator, Generator};
use crate::metrics;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument, warn};

const SUBSYSTEM: &str = "semantic_index";

/// Result of a (re)indexing run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndexOutcome {
    /// A fresh index is active
    Ready { documents: usize, chunks: usize },
    /// The directory had nothing to index; the previous index, if any, stays
    EmptyCorpus { path: String },
}

/// Query handle over one built index
pub struct QueryEngine {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
}

impl QueryEngine {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
        }
    }

    /// Retrieve, fuse and generate for an already enriched query
    pub async fn query(&self, enriched_query: &str, top_k: usize) -> Result<SearchResult> {
        let vector = self.embedder.embed(enriched_query).await?;
        let chunks = self.store.nearest(&vector, top_k).await?;

        let prompt = build_prompt(enriched_query, &chunks);
        let response = self.generator.generate(&prompt).await?;

        Ok(SearchResult {
            response,
            sources: chunks.iter().map(SourceNode::from).collect(),
        })
    }

    /// Chunks held by this snapshot
    pub async fn chunk_count(&self) -> usize {
        self.store.len().await
    }
}

struct Clients {
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
}

/// Semantic retrieval service
pub struct RagService {
    index: IndexConfig,
    embedding: EmbeddingConfig,
    llm: LlmConfig,
    lifecycle: Lifecycle,
    clients: RwLock<Option<Clients>>,
    engine: RwLock<Option<Arc<QueryEngine>>>,
    // One rebuild at a time; queries never wait on this
    rebuild: Mutex<()>,
}

impl RagService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            index: config.index.clone(),
            embedding: config.embedding.clone(),
            llm: config.llm.clone(),
            lifecycle: Lifecycle::new(SUBSYSTEM),
            clients: RwLock::new(None),
            engine: RwLock::new(None),
            rebuild: Mutex::new(()),
        }
    }

    /// Directory indexed at startup and by a reload without a path
    pub fn docs_dir(&self) -> &str {
        &self.index.docs_dir
    }

    /// Passages retrieved when the caller does not ask for a number
    pub fn default_top_k(&self) -> usize {
        self.index.default_top_k
    }

    pub async fn state(&self) -> SubsystemState {
        self.lifecycle.current().await
    }

    /// True while the lifecycle is `Ready`
    pub async fn is_ready(&self) -> bool {
        self.lifecycle.is_ready().await
    }

    async fn has_engine(&self) -> bool {
        self.engine.read().await.is_some()
    }

    /// Build the embedding and generation clients from configuration.
    ///
    /// A failure while an index is active keeps the previous clients and the
    /// index serving; the subsystem stays `Ready`.
    pub async fn initialize(&self) -> Result<()> {
        if !self.has_engine().await {
            self.lifecycle.transition(SubsystemState::Initializing).await;
        }

        let clients = create_embedder(&self.embedding)
            .and_then(|embedder| Ok((embedder, create_generator(&self.llm)?)));

        match clients {
            Ok((embedder, generator)) => {
                info!(
                    embedding_model = embedder.model_name(),
                    generation_model = generator.model_name(),
                    "Semantic clients ready"
                );
                self.install_clients(embedder, generator).await;
                Ok(())
            }
            Err(e) => {
                if self.has_engine().await {
                    warn!(error = %e, "Failed to rebuild semantic clients, keeping active index");
                } else {
                    error!(error = %e, "Failed to build semantic clients");
                    self.lifecycle.fail(e.to_string()).await;
                }
                Err(e)
            }
        }
    }

    /// Use the given clients instead of the configured providers
    pub async fn initialize_with(&self, embedder: Arc<dyn Embedder>, generator: Arc<dyn Generator>) {
        if !self.has_engine().await {
            self.lifecycle.transition(SubsystemState::Initializing).await;
        }
        self.install_clients(embedder, generator).await;
    }

    async fn install_clients(&self, embedder: Arc<dyn Embedder>, generator: Arc<dyn Generator>) {
        *self.clients.write().await = Some(Clients {
            embedder,
            generator,
        });
        // Clients changed under a live index: keep serving it
        if self.has_engine().await {
            self.lifecycle.transition(SubsystemState::Ready).await;
        }
    }

    /// Rebuild the index from every eligible file in `path`.
    ///
    /// The new engine replaces the active one only after the build finishes.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load_documents(&self, path: impl AsRef<Path>) -> Result<IndexOutcome> {
        let path = path.as_ref();
        let _guard = self.rebuild.lock().await;

        let (embedder, generator) = {
            let clients = self.clients.read().await;
            match clients.as_ref() {
                Some(c) => (c.embedder.clone(), c.generator.clone()),
                None => {
                    return Err(AppError::NotInitialized {
                        subsystem: SUBSYSTEM.to_string(),
                    })
                }
            }
        };

        let start = Instant::now();
        let builder = IndexBuilder::new(embedder.clone(), &self.index, self.embedding.batch_size);

        match builder.build(path).await {
            Ok(Some(built)) => {
                let engine = Arc::new(QueryEngine::new(built.store, embedder, generator));
                *self.engine.write().await = Some(engine);
                self.lifecycle.transition(SubsystemState::Ready).await;

                metrics::record_index_build(start.elapsed().as_secs_f64(), "ready", built.chunks);
                info!(
                    documents = built.documents,
                    chunks = built.chunks,
                    "Documents indexed"
                );
                Ok(IndexOutcome::Ready {
                    documents: built.documents,
                    chunks: built.chunks,
                })
            }
            Ok(None) => {
                warn!("No eligible documents found");
                metrics::record_index_build(start.elapsed().as_secs_f64(), "empty", 0);
                if !self.has_engine().await {
                    self.lifecycle
                        .fail(format!("no indexable documents in {}", path.display()))
                        .await;
                }
                Ok(IndexOutcome::EmptyCorpus {
                    path: path.display().to_string(),
                })
            }
            Err(e) => {
                error!(error = %e, "Index build failed");
                metrics::record_index_build(start.elapsed().as_secs_f64(), "failed", 0);
                if !self.has_engine().await {
                    self.lifecycle.fail(e.to_string()).await;
                }
                Err(e)
            }
        }
    }

    /// Answer a query from the active index.
    ///
    /// Upstream failures are logged here and surface as `RetrievalFailed`.
    #[instrument(skip_all, fields(top_k = top_k, history_len = history.map_or(0, |h| h.len())))]
    pub async fn search(
        &self,
        query: &str,
        history: Option<&[ConversationMessage]>,
        top_k: usize,
    ) -> Result<SearchResult> {
        if top_k == 0 {
            return Err(AppError::validation("top_k", "top_k must be at least 1"));
        }

        // Snapshot the handle; the read lock is released before any I/O
        let engine = self
            .engine
            .read()
            .await
            .clone()
            .ok_or_else(|| AppError::NotInitialized {
                subsystem: SUBSYSTEM.to_string(),
            })?;

        let with_history = history.map_or(false, |h| !h.is_empty());
        let enriched = enrich_query(query, history);
        let start = Instant::now();

        match engine.query(&enriched, top_k).await {
            Ok(result) => {
                metrics::record_search(
                    start.elapsed().as_secs_f64(),
                    result.sources.len(),
                    with_history,
                    true,
                );
                Ok(result)
            }
            Err(e) => {
                error!(error = %e, chain = %error_chain(&e), "Search failed");
                metrics::record_search(start.elapsed().as_secs_f64(), 0, with_history, false);
                Err(AppError::RetrievalFailed)
            }
        }
    }

    /// Drop the index and clients
    pub async fn shutdown(&self) {
        let _guard = self.rebuild.lock().await;
        self.engine.write().await.take();
        self.clients.write().await.take();
        self.lifecycle.transition(SubsystemState::Uninitialized).await;
    }
}

//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use iotrag_common::embeddings::{Embedder, MockEmbedder};
use iotrag_common::errors::{AppError, Result};
use iotrag_common::llm::{Generator, MockGenerator};
use iotrag_common::{AppConfig, RagService};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const MQTT_DOC: &str = "MQTT is a lightweight publish-subscribe protocol designed for \
constrained devices and unreliable networks. Clients publish messages to topics on a broker.";

pub const COAP_DOC: &str = "CoAP is the Constrained Application Protocol. It runs over UDP and \
gives resource-limited nodes a RESTful request model.";

pub const LORAWAN_DOC: &str = "LoRaWAN is a long range wide area network protocol. Gateways relay \
packets from battery powered field sensors kilometres away.";

/// Embedder that counts every call
pub struct CountingEmbedder {
    inner: MockEmbedder,
    pub calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self {
            inner: MockEmbedder::new(256),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_batch(texts).await
    }

    fn model_name(&self) -> &str {
        "counting-embedding"
    }
}

/// Embedder whose batches come back one vector short
pub struct ShortBatchEmbedder(pub MockEmbedder);

#[async_trait]
impl Embedder for ShortBatchEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.0.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = self.0.embed_batch(texts).await?;
        embeddings.pop();
        Ok(embeddings)
    }

    fn model_name(&self) -> &str {
        "short-batch-embedding"
    }
}

/// Generator that counts every call and may be told to fail
#[derive(Default)]
pub struct CountingGenerator {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl CountingGenerator {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for CountingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::GenerationError {
                message: "model crashed".to_string(),
            });
        }
        MockGenerator.generate(prompt).await
    }

    fn model_name(&self) -> &str {
        "counting-generator"
    }
}

pub fn write_docs(dir: &Path, docs: &[(&str, &str)]) {
    for (name, text) in docs {
        std::fs::write(dir.join(name), text).unwrap();
    }
}

/// Service with mock clients, not yet indexed
pub async fn mock_service() -> RagService {
    let service = RagService::new(&AppConfig::default());
    service
        .initialize_with(Arc::new(MockEmbedder::new(256)), Arc::new(MockGenerator))
        .await;
    service
}

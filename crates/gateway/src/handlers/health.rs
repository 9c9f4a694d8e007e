//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use iotrag_common::VERSION;

#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub rag_initialized: bool,
    pub graph_initialized: bool,
}

/// Service banner
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "IoT RAG Chatbot API".to_string(),
        status: "running".to_string(),
        version: VERSION.to_string(),
    })
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// Readiness probe - both the semantic index and the graph must be up
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let readiness = iotrag_common::readiness(&state.rag, &state.graph).await;

    Json(ReadyResponse {
        status: if readiness.is_ready() { "ready" } else { "not_ready" }.to_string(),
        rag_initialized: readiness.semantic_index_ready,
        graph_initialized: readiness.graph_ready,
    })
}

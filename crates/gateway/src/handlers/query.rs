//! Question answering handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate_request;
use crate::AppState;
use iotrag_common::{errors::Result, ConversationMessage, SourceNode};

/// Query request
#[derive(Debug, Deserialize, Validate)]
pub struct QueryRequest {
    #[validate(length(min = 1, max = 4000))]
    pub query: String,

    /// Passages to retrieve (defaults to the configured value)
    #[validate(range(min = 1, max = 50))]
    pub top_k: Option<usize>,

    /// Earlier turns, oldest first
    #[serde(default)]
    pub conversation_history: Option<Vec<ConversationMessage>>,
}

/// Query response
#[derive(Serialize)]
pub struct QueryResponse {
    pub query: String,
    pub response: String,
    pub sources: Vec<SourceNode>,
}

/// Answer a question from the indexed documents
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    validate_request(&request)?;

    let top_k = request.top_k.unwrap_or_else(|| state.rag.default_top_k());
    let result = state
        .rag
        .search(&request.query, request.conversation_history.as_deref(), top_k)
        .await?;

    tracing::info!(
        top_k,
        sources = result.sources.len(),
        "Query answered"
    );

    Ok(Json(QueryResponse {
        query: request.query,
        response: result.response,
        sources: result.sources,
    }))
}

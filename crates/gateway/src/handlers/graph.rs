//! Concept graph handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate_request;
use crate::AppState;
use iotrag_common::{errors::Result, NeighborLookup, RelatedConcept};

#[derive(Debug, Deserialize, Validate)]
pub struct RelatedConceptsRequest {
    #[validate(length(min = 1))]
    pub concept_id: String,

    #[serde(default = "default_max_depth")]
    #[validate(range(min = 1, max = 10))]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    2
}

#[derive(Serialize)]
pub struct RelatedConceptsResponse {
    pub concept_id: String,
    pub related_concepts: Vec<RelatedConcept>,
    pub count: usize,
}

/// Concepts connected to the given one within `max_depth` hops
pub async fn related_concepts(
    State(state): State<AppState>,
    Json(request): Json<RelatedConceptsRequest>,
) -> Result<Json<RelatedConceptsResponse>> {
    validate_request(&request)?;

    let lookup = state
        .graph
        .get_related_concepts(&request.concept_id, request.max_depth)
        .await;
    if lookup == NeighborLookup::Unavailable {
        tracing::warn!(concept_id = %request.concept_id, "Graph unavailable, returning no concepts");
    }

    let related_concepts = lookup.into_vec();
    Ok(Json(RelatedConceptsResponse {
        concept_id: request.concept_id,
        count: related_concepts.len(),
        related_concepts,
    }))
}

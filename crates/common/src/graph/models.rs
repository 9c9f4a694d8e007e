//! Concept graph data model

use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Relationship types are spliced into Cypher, so they must be plain identifiers
const RELATIONSHIP_TYPE_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Category of a concept
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConceptType {
    Protocol,
    Technology,
    UseCase,
    SecurityPractice,
    Custom(String),
}

impl ConceptType {
    pub fn as_str(&self) -> &str {
        match self {
            ConceptType::Protocol => "protocol",
            ConceptType::Technology => "technology",
            ConceptType::UseCase => "use_case",
            ConceptType::SecurityPractice => "security_practice",
            ConceptType::Custom(label) => label,
        }
    }
}

impl From<String> for ConceptType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "protocol" => ConceptType::Protocol,
            "technology" => ConceptType::Technology,
            "use_case" => ConceptType::UseCase,
            "security_practice" => ConceptType::SecurityPractice,
            _ => ConceptType::Custom(label),
        }
    }
}

impl From<&str> for ConceptType {
    fn from(label: &str) -> Self {
        ConceptType::from(label.to_string())
    }
}

impl From<ConceptType> for String {
    fn from(concept_type: ConceptType) -> Self {
        concept_type.as_str().to_string()
    }
}

impl fmt::Display for ConceptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A graph node, unique by `id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub concept_type: ConceptType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, serde_json::Value>,
}

impl Concept {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        concept_type: impl Into<ConceptType>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            concept_type: concept_type.into(),
            description: None,
            properties: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A typed, directed edge between two existing concepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, serde_json::Value>,
}

impl Relationship {
    pub fn new(
        source_id: impl Into<String>,
        relationship_type: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relationship_type: relationship_type.into(),
            properties: HashMap::new(),
        }
    }

    /// Reject relationship types that are not identifiers
    pub fn validate(&self) -> Result<()> {
        validate_relationship_type(&self.relationship_type)
    }
}

pub fn validate_relationship_type(relationship_type: &str) -> Result<()> {
    let pattern = regex_lite::Regex::new(RELATIONSHIP_TYPE_PATTERN).map_err(|e| AppError::Internal {
        message: format!("Invalid relationship type pattern: {}", e),
    })?;

    if pattern.is_match(relationship_type) {
        Ok(())
    } else {
        Err(AppError::validation(
            "relationship_type",
            format!("'{}' is not a valid relationship type", relationship_type),
        ))
    }
}

/// One neighbor returned by a traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedConcept {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub concept_type: String,
    pub description: Option<String>,
}

impl From<&Concept> for RelatedConcept {
    fn from(concept: &Concept) -> Self {
        Self {
            id: concept.id.clone(),
            name: concept.name.clone(),
            concept_type: concept.concept_type.to_string(),
            description: concept.description.clone(),
        }
    }
}

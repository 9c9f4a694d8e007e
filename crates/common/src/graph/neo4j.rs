//! Neo4j adapter over the HTTP transactional endpoint
//!
//! Each call is one auto-committed transaction:
//! `POST {uri}/db/{database}/tx/commit` with basic auth.

use super::models::{validate_relationship_type, Concept, RelatedConcept, Relationship};
use super::store::GraphStore;
use crate::config::GraphConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// One Cypher statement with its parameters
#[derive(Debug, Clone, Serialize)]
pub struct Statement {
    pub statement: String,
    pub parameters: Value,
}

#[derive(Serialize)]
struct TxRequest<'a> {
    statements: [&'a Statement; 1],
}

#[derive(Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Deserialize)]
struct TxResult {
    columns: Vec<String>,
    data: Vec<TxRow>,
}

#[derive(Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Deserialize)]
struct TxError {
    code: String,
    message: String,
}

/// Map a driver-style URI onto the HTTP endpoint of the same server
pub fn http_base_url(uri: &str) -> String {
    let uri = uri.trim_end_matches('/');
    for scheme in ["bolt://", "neo4j://", "bolt+s://", "neo4j+s://"] {
        if let Some(rest) = uri.strip_prefix(scheme) {
            let secure = scheme.contains("+s");
            let host = match rest.strip_suffix(":7687") {
                Some(host) => format!("{}:{}", host, if secure { 7473 } else { 7474 }),
                None => rest.to_string(),
            };
            return format!("{}://{}", if secure { "https" } else { "http" }, host);
        }
    }
    uri.to_string()
}

pub fn ping_statement() -> Statement {
    Statement {
        statement: "RETURN 1 AS ok".to_string(),
        parameters: json!({}),
    }
}

pub fn concept_statement(concept: &Concept) -> Statement {
    Statement {
        statement: "MERGE (c:Concept {id: $id}) \
                    SET c.name = $name, c.type = $type, c.description = $description \
                    SET c += $properties \
                    RETURN c.id AS id"
            .to_string(),
        parameters: json!({
            "id": concept.id,
            "name": concept.name,
            "type": concept.concept_type.as_str(),
            "description": concept.description,
            "properties": concept.properties,
        }),
    }
}

/// The relationship type is interpolated, so it is validated first
pub fn relationship_statement(relationship: &Relationship) -> Result<Statement> {
    validate_relationship_type(&relationship.relationship_type)?;

    Ok(Statement {
        statement: format!(
            "MATCH (source:Concept {{id: $source_id}}) \
             MATCH (target:Concept {{id: $target_id}}) \
             MERGE (source)-[r:{}]->(target) \
             SET r += $properties \
             RETURN count(r) AS merged",
            relationship.relationship_type
        ),
        parameters: json!({
            "source_id": relationship.source_id,
            "target_id": relationship.target_id,
            "properties": relationship.properties,
        }),
    })
}

pub fn exists_statement(id: &str) -> Statement {
    Statement {
        statement: "MATCH (c:Concept {id: $id}) RETURN count(c) AS found".to_string(),
        parameters: json!({ "id": id }),
    }
}

/// Variable-length patterns cannot take a parameter for the bound
pub fn neighbors_statement(id: &str, max_depth: usize, limit: usize) -> Statement {
    Statement {
        statement: format!(
            "MATCH path = (c:Concept {{id: $id}})-[*1..{}]-(related:Concept) \
             WHERE related.id <> c.id \
             WITH related, min(length(path)) AS hops \
             RETURN related.id AS id, related.name AS name, related.type AS type, \
             related.description AS description, hops \
             ORDER BY hops, id \
             LIMIT $limit",
            max_depth.max(1)
        ),
        parameters: json!({ "id": id, "limit": limit }),
    }
}

/// Neo4j graph store
pub struct Neo4jGraphStore {
    client: reqwest::Client,
    endpoint: String,
    user: String,
    password: String,
}

impl Neo4jGraphStore {
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create Neo4j HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/db/{}/tx/commit",
                http_base_url(&config.uri),
                config.database
            ),
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    /// Run one statement and return its rows keyed by column name
    pub async fn run_query(&self, statement: &Statement) -> Result<Vec<HashMap<String, Value>>> {
        debug!(statement = %statement.statement, "Running Cypher");

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .json(&TxRequest {
                statements: [statement],
            })
            .send()
            .await
            .map_err(|e| AppError::GraphError {
                message: format!("Neo4j request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GraphError {
                message: format!("Neo4j error {}: {}", status, body),
            });
        }

        let body: TxResponse = response.json().await.map_err(|e| AppError::GraphError {
            message: format!("Failed to parse Neo4j response: {}", e),
        })?;

        rows_from_response(body)
    }

    async fn count(&self, statement: &Statement, column: &str) -> Result<i64> {
        let rows = self.run_query(statement).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get(column))
            .and_then(Value::as_i64)
            .unwrap_or(0))
    }
}

fn rows_from_response(body: TxResponse) -> Result<Vec<HashMap<String, Value>>> {
    if let Some(err) = body.errors.first() {
        return Err(AppError::GraphError {
            message: format!("{}: {}", err.code, err.message),
        });
    }

    Ok(body
        .results
        .into_iter()
        .next()
        .map(|result| {
            result
                .data
                .into_iter()
                .map(|data| result.columns.iter().cloned().zip(data.row).collect())
                .collect()
        })
        .unwrap_or_default())
}

fn related_from_row(row: &HashMap<String, Value>) -> Option<RelatedConcept> {
    let text = |key: &str| row.get(key).and_then(Value::as_str).map(str::to_string);
    Some(RelatedConcept {
        id: text("id")?,
        name: text("name").unwrap_or_default(),
        concept_type: text("type").unwrap_or_default(),
        description: text("description"),
    })
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn ping(&self) -> Result<()> {
        self.run_query(&ping_statement()).await.map(|_| ())
    }

    async fn upsert_concept(&self, concept: &Concept) -> Result<()> {
        self.run_query(&concept_statement(concept)).await.map(|_| ())
    }

    async fn upsert_relationship(&self, relationship: &Relationship) -> Result<()> {
        let statement = relationship_statement(relationship)?;
        if self.count(&statement, "merged").await? > 0 {
            return Ok(());
        }

        // Nothing merged: name the endpoint that is missing
        let missing = if self.concept_exists(&relationship.source_id).await? {
            &relationship.target_id
        } else {
            &relationship.source_id
        };
        Err(AppError::NotFound {
            resource_type: "concept".to_string(),
            id: missing.clone(),
        })
    }

    async fn concept_exists(&self, id: &str) -> Result<bool> {
        Ok(self.count(&exists_statement(id), "found").await? > 0)
    }

    async fn neighbors(&self, id: &str, max_depth: usize, limit: usize) -> Result<Vec<RelatedConcept>> {
        let rows = self.run_query(&neighbors_statement(id, max_depth, limit)).await?;
        Ok(rows.iter().filter_map(related_from_row).collect())
    }

    fn backend(&self) -> &'static str {
        "neo4j"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::models::ConceptType;

    #[test]
    fn test_http_base_url() {
        assert_eq!(http_base_url("bolt://neo4j:7687"), "http://neo4j:7474");
        assert_eq!(http_base_url("neo4j+s://db.example:7687"), "https://db.example:7473");
        assert_eq!(http_base_url("http://localhost:7474/"), "http://localhost:7474");
        assert_eq!(http_base_url("bolt://graph"), "http://graph");
    }

    #[test]
    fn test_neighbors_statement_embeds_depth() {
        let stmt = neighbors_statement("mqtt", 3, 20);
        assert!(stmt.statement.contains("[*1..3]"));
        assert!(stmt.statement.contains("ORDER BY hops, id"));
        assert_eq!(stmt.parameters["id"], "mqtt");
        assert_eq!(stmt.parameters["limit"], 20);

        assert!(neighbors_statement("mqtt", 0, 20).statement.contains("[*1..1]"));
    }

    #[test]
    fn test_relationship_statement() {
        let rel = Relationship::new("mqtt", "USED_IN", "smart_home");
        let stmt = relationship_statement(&rel).unwrap();
        assert!(stmt.statement.contains("MERGE (source)-[r:USED_IN]->(target)"));
        assert_eq!(stmt.parameters["source_id"], "mqtt");
        assert_eq!(stmt.parameters["target_id"], "smart_home");

        let injected = Relationship::new("a", "X]->(b) DETACH DELETE b //", "c");
        assert!(relationship_statement(&injected).is_err());
    }

    #[test]
    fn test_concept_statement_parameters() {
        let concept = Concept::new("coap", "CoAP", ConceptType::Protocol);
        let stmt = concept_statement(&concept);
        assert!(stmt.statement.starts_with("MERGE (c:Concept {id: $id})"));
        assert_eq!(stmt.parameters["type"], "protocol");
        assert!(stmt.parameters["description"].is_null());
    }

    #[test]
    fn test_rows_keyed_by_column() {
        let body: TxResponse = serde_json::from_value(json!({
            "results": [{
                "columns": ["id", "name", "type", "description", "hops"],
                "data": [
                    {"row": ["smart_home", "Smart Home", "use_case", null, 1], "meta": []}
                ]
            }],
            "errors": []
        }))
        .unwrap();

        let rows = rows_from_response(body).unwrap();
        let related = related_from_row(&rows[0]).unwrap();
        assert_eq!(related.id, "smart_home");
        assert_eq!(related.concept_type, "use_case");
        assert_eq!(related.description, None);
    }

    #[test]
    fn test_error_payload_becomes_graph_error() {
        let body: TxResponse = serde_json::from_value(json!({
            "results": [],
            "errors": [{"code": "Neo.ClientError.Statement.SyntaxError", "message": "bad"}]
        }))
        .unwrap();

        let err = rows_from_response(body).unwrap_err();
        assert!(matches!(err, AppError::GraphError { .. }));
    }
}

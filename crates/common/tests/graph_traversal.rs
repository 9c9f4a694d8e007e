//! Concept graph traversal and seeding against the in-memory store

mod common;

use common::{mock_service, write_docs, MQTT_DOC};
use iotrag_common::config::GraphConfig;
use iotrag_common::graph::{
    seed_graph, Concept, ConceptType, GraphService, GraphStore, InMemoryGraphStore, NeighborLookup,
    Relationship, MAX_RELATED_CONCEPTS,
};
use iotrag_common::readiness;
use std::sync::Arc;

fn memory_config() -> GraphConfig {
    GraphConfig {
        backend: "memory".to_string(),
        ..GraphConfig::default()
    }
}

async fn seeded_service() -> GraphService {
    let service = GraphService::new(&memory_config());
    service.connect().await.unwrap();
    let report = service.initialize_sample_graph().await.unwrap();
    assert!(report.is_complete());
    service
}

#[tokio::test]
async fn test_mqtt_related_includes_smart_home() {
    let service = seeded_service().await;

    let related = service.get_related_concepts("mqtt", 2).await.into_vec();
    let smart_home = related.iter().find(|c| c.id == "smart_home").unwrap();

    assert_eq!(smart_home.name, "Smart Home");
    assert_eq!(smart_home.concept_type, "use_case");
    assert_eq!(
        smart_home.description.as_deref(),
        Some("Home automation using IoT devices")
    );
}

#[tokio::test]
async fn test_neighbors_deduplicated_and_capped() {
    let store = Arc::new(InMemoryGraphStore::new());
    store
        .upsert_concept(&Concept::new("hub", "Hub", ConceptType::Technology))
        .await
        .unwrap();

    // Thirty spokes, each also linked to the next so some ids are reachable twice
    for i in 0..30 {
        let id = format!("node_{:02}", i);
        store
            .upsert_concept(&Concept::new(id.clone(), id.to_uppercase(), "sensor"))
            .await
            .unwrap();
        store
            .upsert_relationship(&Relationship::new("hub", "CONNECTS", id.clone()))
            .await
            .unwrap();
        if i > 0 {
            store
                .upsert_relationship(&Relationship::new(format!("node_{:02}", i - 1), "NEXT", id))
                .await
                .unwrap();
        }
    }

    let service = GraphService::new(&memory_config());
    service.connect_with(store).await.unwrap();

    let related = service.get_related_concepts("hub", 3).await.into_vec();
    assert_eq!(related.len(), MAX_RELATED_CONCEPTS);

    let ids: Vec<_> = related.iter().map(|c| c.id.clone()).collect();
    let expected: Vec<_> = (0..20).map(|i| format!("node_{:02}", i)).collect();
    assert_eq!(ids, expected);
    assert!(!ids.contains(&"hub".to_string()));
}

#[tokio::test]
async fn test_seeding_twice_is_idempotent() {
    let store = InMemoryGraphStore::new();
    let first = seed_graph(&store).await;
    let second = seed_graph(&store).await;

    assert_eq!(first, second);
    assert_eq!(store.concept_count().await, 9);
    assert_eq!(store.relationship_count().await, 7);
}

#[tokio::test]
async fn test_lookup_outcomes() {
    let service = seeded_service().await;

    assert!(matches!(
        service.get_related_concepts("lorawan", 1).await,
        NeighborLookup::Found(ref c) if c.len() == 1 && c[0].id == "iiot"
    ));
    assert_eq!(
        service.get_related_concepts("thread", 2).await,
        NeighborLookup::Empty
    );

    service.close().await;
    assert_eq!(
        service.get_related_concepts("mqtt", 2).await,
        NeighborLookup::Unavailable
    );
}

#[tokio::test]
async fn test_readiness_requires_both_subsystems() {
    let graph = seeded_service().await;
    let rag = mock_service().await;

    let before = readiness(&rag, &graph).await;
    assert!(before.graph_ready);
    assert!(!before.semantic_index_ready);
    assert!(!before.is_ready());

    let dir = tempfile::tempdir().unwrap();
    write_docs(dir.path(), &[("mqtt.txt", MQTT_DOC)]);
    rag.load_documents(dir.path()).await.unwrap();

    assert!(readiness(&rag, &graph).await.is_ready());
}

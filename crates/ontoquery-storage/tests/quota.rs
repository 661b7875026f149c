//! Quota split across sibling type paths

use ontoquery_core::{CancelSignal, Direction, SubgraphQuery, SubgraphResult, TraversalConfig};
use ontoquery_storage::Dataset;

const HUB: &str = r#"{
    "kn_id": "hub",
    "object_types": [
        {"id": "hub", "primary_keys": ["id"], "status": {"index_available": true, "index": "idx_hub"}},
        {"id": "alpha", "primary_keys": ["id"], "status": {"index_available": true, "index": "idx_alpha"}},
        {"id": "beta", "primary_keys": ["id"], "status": {"index_available": true, "index": "idx_beta"}}
    ],
    "relation_types": [
        {
            "id": "to_beta",
            "source_object_type_id": "hub",
            "target_object_type_id": "beta",
            "type": "direct",
            "mapping_rules": [{"source_property": "id", "target_property": "hub"}]
        },
        {
            "id": "to_alpha",
            "source_object_type_id": "hub",
            "target_object_type_id": "alpha",
            "type": "direct",
            "mapping_rules": [{"source_property": "id", "target_property": "hub"}]
        }
    ],
    "indexes": {
        "idx_hub": [{"id": 1}],
        "idx_alpha": [{"id": "a1", "hub": 1}, {"id": "a2", "hub": 1}, {"id": "a3", "hub": 1}],
        "idx_beta": [{"id": "b1", "hub": 1}, {"id": "b2", "hub": 1}, {"id": "b3", "hub": 1}]
    }
}"#;

async fn run(query: SubgraphQuery) -> SubgraphResult {
    let engine = Dataset::from_json(HUB)
        .unwrap()
        .into_backends()
        .unwrap()
        .engine(TraversalConfig::default().with_max_concurrency(2));
    engine.query(&query, &CancelSignal::none()).await.unwrap()
}

fn relation_types(result: &SubgraphResult) -> Vec<&str> {
    result
        .entries
        .iter()
        .map(|p| p.relations[0].relation_type_id.as_str())
        .collect()
}

#[tokio::test]
async fn test_remainder_goes_to_first_type_path() {
    // Type paths are enumerated by relation type id: to_alpha, then to_beta
    let result = run(SubgraphQuery::new("hub", "hub").with_total_limit(3)).await;
    assert_eq!(result.total_count, 3);
    assert!(result.quota_exhausted);
    assert_eq!(relation_types(&result), vec!["to_alpha", "to_alpha", "to_beta"]);
}

#[tokio::test]
async fn test_split_is_stable_across_runs() {
    let query = SubgraphQuery::new("hub", "hub").with_total_limit(4);
    let first = run(query.clone()).await;
    for _ in 0..5 {
        let again = run(query.clone()).await;
        assert_eq!(again.entries, first.entries);
    }
    assert_eq!(relation_types(&first), vec!["to_alpha", "to_alpha", "to_beta", "to_beta"]);
}

#[tokio::test]
async fn test_quota_larger_than_results() {
    let result = run(SubgraphQuery::new("hub", "hub").with_total_limit(100)).await;
    assert_eq!(result.total_count, 6);
    assert!(!result.quota_exhausted);
}

#[tokio::test]
async fn test_bidirectional_from_leaf() {
    let query = SubgraphQuery::new("hub", "alpha").with_direction(Direction::Bidirectional);
    let result = run(query).await;
    // Every alpha points back at the single hub
    assert_eq!(result.total_count, 3);
    assert!(result
        .entries
        .iter()
        .all(|p| p.relations[0].target_object_id == "hub-1"));
}

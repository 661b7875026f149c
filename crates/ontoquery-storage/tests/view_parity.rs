//! The SQLite view store returns the same rows as the in-memory one for the
//! same rendered condition

#![cfg(feature = "sqlite")]

use ontoquery_condition::{render, ConditionCompiler, PropertyResolver};
use ontoquery_core::{CondCfg, ObjectData, Operation};
use ontoquery_storage::{MemoryViewStore, SqliteViewStore, ViewFilter, ViewStore};
use serde_json::{json, Value};

fn rows() -> Vec<ObjectData> {
    [
        json!({"id": 1, "name": "alice", "age": 30, "note": "graph databases"}),
        json!({"id": 2, "age": 70}),
        json!({"id": 3, "name": "bob", "note": "relational"}),
        json!({"id": 4, "name": "ALICE", "age": 10}),
    ]
    .into_iter()
    .map(|v| match v {
        Value::Object(map) => map,
        _ => unreachable!(),
    })
    .collect()
}

async fn ids(store: &dyn ViewStore, filter: &ViewFilter) -> Vec<Value> {
    let mut ids: Vec<Value> = store
        .get_view_data_by_id("people", filter, 100)
        .await
        .unwrap()
        .rows
        .into_iter()
        .map(|r| r["id"].clone())
        .collect();
    ids.sort_by_key(|v| v.as_i64());
    ids
}

async fn assert_same_rows(cond: CondCfg, expected: Vec<Value>) {
    let rendered = render(
        &ConditionCompiler::default(),
        Some(&cond),
        &PropertyResolver::schemaless(),
    )
    .await
    .unwrap();
    let filter = ViewFilter {
        dsl: rendered.dsl,
        sql: rendered.sql,
    };

    let memory = MemoryViewStore::new();
    memory.insert_rows("people", rows()).unwrap();
    let sqlite = SqliteViewStore::in_memory().unwrap();
    sqlite.create_view("people", &rows()).unwrap();

    let from_memory = ids(&memory, &filter).await;
    let from_sqlite = ids(&sqlite, &filter).await;
    assert_eq!(from_memory, expected, "memory rows for {}", filter.sql);
    assert_eq!(from_sqlite, expected, "sqlite rows for {}", filter.sql);
}

#[tokio::test]
async fn test_negations_keep_rows_missing_the_field() {
    assert_same_rows(
        CondCfg::new("name", Operation::NotEq, json!("alice")),
        vec![json!(2), json!(3), json!(4)],
    )
    .await;
    assert_same_rows(
        CondCfg::new("name", Operation::NotIn, json!(["alice", "bob"])),
        vec![json!(2), json!(4)],
    )
    .await;
    assert_same_rows(
        CondCfg::new("age", Operation::OutRange, json!([20, 60])),
        vec![json!(2), json!(3), json!(4)],
    )
    .await;
}

#[tokio::test]
async fn test_like_is_case_sensitive_on_both_sides() {
    assert_same_rows(
        CondCfg::new("name", Operation::NotLike, json!("lic")),
        vec![json!(2), json!(3), json!(4)],
    )
    .await;
    assert_same_rows(
        CondCfg::new("name", Operation::Like, json!("lic")),
        vec![json!(1)],
    )
    .await;
}

#[tokio::test]
async fn test_and_with_a_clause_sql_cannot_express() {
    let cond = CondCfg::and(vec![
        CondCfg::new("id", Operation::Gte, json!(1)),
        CondCfg::new("note", Operation::Match, json!("graph")),
    ]);
    assert_same_rows(cond, vec![json!(1)]).await;
}

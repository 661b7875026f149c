//! CLI integration tests

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DATASET: &str = r#"{
    "kn_id": "kn1",
    "object_types": [
        {
            "id": "person",
            "primary_keys": ["id"],
            "data_properties": [
                {"name": "id", "type": "integer"},
                {"name": "city", "type": "string"}
            ],
            "status": {"index_available": true, "index": "idx_person"}
        },
        {
            "id": "account",
            "primary_keys": ["acct"],
            "data_source": {"type": "data_view", "id": "v_account"}
        }
    ],
    "relation_types": [
        {
            "id": "owns",
            "source_object_type_id": "person",
            "target_object_type_id": "account",
            "type": "direct",
            "mapping_rules": [{"source_property": "id", "target_property": "owner"}]
        }
    ],
    "indexes": {
        "idx_person": [{"id": 1, "city": "Oslo"}, {"id": 2, "city": "Bergen"}]
    },
    "views": {
        "v_account": [{"acct": "a1", "owner": 1}, {"acct": "a2", "owner": 1}, {"acct": "a3", "owner": 2}]
    }
}"#;

struct Env {
    dir: TempDir,
    dataset: PathBuf,
}

fn env() -> Env {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("kn1.json");
    std::fs::write(&dataset, DATASET).unwrap();
    Env { dir, dataset }
}

fn cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ontoquery").unwrap();
    cmd.env("ONTOQUERY_HOME", home).env_remove("ONTOQUERY_DATASET");
    cmd
}

#[test]
fn test_compile_without_dataset() {
    let env = env();
    cmd(env.dir.path())
        .args(["compile", r#"{"name": "age", "operation": "gte", "value": 18}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"range\""))
        .stdout(predicate::str::contains("\\\"age\\\" >= 18"));
}

#[test]
fn test_compile_rejects_unknown_property_for_type() {
    let env = env();
    cmd(env.dir.path())
        .arg("--dataset")
        .arg(&env.dataset)
        .args(["compile", "-t", "person", r#"{"name": "age", "operation": "eq", "value": 1}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("age"));
}

#[test]
fn test_subgraph_table_output() {
    let env = env();
    cmd(env.dir.path())
        .arg("--dataset")
        .arg(&env.dataset)
        .args(["-f", "table", "subgraph", "person", "-c", r#"{"name": "city", "operation": "eq", "value": "Oslo"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("person-1 -[owns]-> account-a1"))
        .stdout(predicate::str::contains("person-1 -[owns]-> account-a2"))
        .stdout(predicate::str::contains("2 paths"));
}

#[test]
fn test_subgraph_over_sqlite_views() {
    let env = env();
    cmd(env.dir.path())
        .arg("--dataset")
        .arg(&env.dataset)
        .args(["--sqlite", "subgraph", "person", "--total-limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"quota_exhausted\": true"));
}

#[test]
fn test_paths_and_objects() {
    let env = env();
    cmd(env.dir.path())
        .arg("--dataset")
        .arg(&env.dataset)
        .args(["-f", "table", "paths", "account", "--direction", "backward"])
        .assert()
        .success()
        .stdout(predicate::str::contains("account <-[owns]- person"));

    cmd(env.dir.path())
        .arg("--dataset")
        .arg(&env.dataset)
        .args(["objects", "account", "-c", r#"{"name": "owner", "operation": "eq", "value": 2}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"a3\""));
}

#[test]
fn test_missing_dataset_is_reported() {
    let env = env();
    cmd(env.dir.path())
        .args(["subgraph", "person"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No dataset given"));
}

#[test]
fn test_config_round_trip() {
    let env = env();
    cmd(env.dir.path())
        .args(["config", "set", "dataset"])
        .arg(&env.dataset)
        .assert()
        .success();
    cmd(env.dir.path())
        .args(["config", "set", "batch_size", "2"])
        .assert()
        .success();
    cmd(env.dir.path())
        .args(["config", "get", "batch_size"])
        .assert()
        .success()
        .stdout("2\n");
    cmd(env.dir.path())
        .args(["config", "get", "colour"])
        .assert()
        .failure();

    // Dataset now comes from the config file
    cmd(env.dir.path())
        .args(["subgraph", "person"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_count\": 3"));

    cmd(env.dir.path())
        .args(["-f", "table", "config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("batch_size"))
        .stdout(predicate::str::contains("EFFECTIVE"));
    cmd(env.dir.path())
        .args(["config", "unset", "batch_size"])
        .assert()
        .success()
        .stdout("Removed batch_size\n");
    cmd(env.dir.path())
        .args(["config", "get", "batch_size"])
        .assert()
        .success()
        .stdout("(not set)\n");
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let env = env();
    cmd(env.dir.path())
        .args(["config", "init", "--dataset"])
        .arg(&env.dataset)
        .assert()
        .success();
    cmd(env.dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    cmd(env.dir.path())
        .args(["paths", "person"])
        .assert()
        .success()
        .stdout(predicate::str::contains("owns"));
}

#[test]
fn test_serve_answers_over_stdio() {
    let env = env();
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"query_subgraph","arguments":{"source_object_type_id":"person"}}}"#,
        "\n",
    );
    cmd(env.dir.path())
        .arg("--dataset")
        .arg(&env.dataset)
        .arg("serve")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"protocolVersion\""))
        .stdout(predicate::str::contains("total_count"));
}

#[test]
fn test_completions() {
    let env = env();
    cmd(env.dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ontoquery"));
}

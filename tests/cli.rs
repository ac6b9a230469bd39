// SPDX-License-Identifier: MIT OR Apache-2.0

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, content).expect("write file");
}

fn codelens(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("codelens"));
    cmd.current_dir(dir).env("NO_COLOR", "1").env_remove("CODELENS_LOG");
    cmd
}

fn json_output(cmd: &mut Command) -> Value {
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    serde_json::from_str(&stdout).expect("json output")
}

/// Project with the offline hashing embedder configured.
fn project() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    write_file(
        &dir.path().join(".codelensrc.toml"),
        "[embeddings]\nprovider = \"hashing\"\n",
    );
    write_file(
        &dir.path().join("a.py"),
        "def foo(values):\n    return [value + 1 for value in values if value]\n",
    );
    write_file(
        &dir.path().join("src/b.py"),
        "class Bar:\n    def baz(self, items):\n        total = sum(item.weight for item in items)\n        return total * 2\n",
    );
    dir
}

fn indexed_project() -> TempDir {
    let dir = project();
    codelens(dir.path())
        .args(["index", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexed 2 files into 3 chunks"));
    dir
}

#[test]
fn index_then_search_finds_method() {
    let dir = indexed_project();

    let results = json_output(codelens(dir.path()).args([
        "--format", "json", "search", "baz method", "--top-k", "1",
    ]));
    let results = results.as_array().expect("array");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["metadata"]["name"], "baz");
    assert_eq!(results[0]["metadata"]["chunk_type"], "method");
    assert_eq!(results[0]["metadata"]["parent_context"], "Bar");
    assert_eq!(results[0]["metadata"]["file_path"], "src/b.py");
    assert_eq!(results[0]["rank"], 1);
}

#[test]
fn text_search_prints_location() {
    let dir = indexed_project();

    codelens(dir.path())
        .args(["search", "baz method", "-k", "1", "--content"])
        .assert()
        .success()
        .stdout(predicate::str::contains("src/b.py:2-4"))
        .stdout(predicate::str::contains("Bar.baz"))
        .stdout(predicate::str::contains("total = sum("));
}

#[test]
fn search_filters_by_type_and_language() {
    let dir = indexed_project();

    let results = json_output(codelens(dir.path()).args([
        "--format", "json", "search", "foo values", "--type", "function", "--threshold", "0",
    ]));
    let results = results.as_array().expect("array");
    assert!(!results.is_empty());
    assert!(results
        .iter()
        .all(|r| r["metadata"]["chunk_type"] == "function"));

    let results = json_output(codelens(dir.path()).args([
        "--format", "json", "search", "foo values", "--language", "rust",
    ]));
    assert_eq!(results.as_array().map(Vec::len), Some(0));

    codelens(dir.path())
        .args(["search", "foo", "--language", "klingon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown language"));
}

#[test]
fn search_without_index_fails() {
    let dir = project();

    codelens(dir.path())
        .args(["search", "anything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no index found"));
}

#[test]
fn stats_reports_histograms() {
    let dir = indexed_project();

    let stats = json_output(codelens(dir.path()).args(["--format", "json", "stats"]));
    assert_eq!(stats["total_chunks"], 3);
    assert_eq!(stats["collection_name"], "code_intelligence");
    assert_eq!(stats["embedding_model"], "hashing-384");
    assert_eq!(stats["distance_metric"], "cosine");
    assert_eq!(stats["chunk_types"]["method"], 1);
    assert_eq!(stats["languages"]["python"], 3);
}

#[test]
fn get_and_delete_by_id() {
    let dir = indexed_project();

    let results = json_output(codelens(dir.path()).args([
        "--format", "json", "search", "baz method", "-k", "1",
    ]));
    let id = results[0]["chunk_id"].as_str().expect("id").to_string();
    assert!(id.starts_with("python_method_"));

    codelens(dir.path())
        .args(["get", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("def baz(self, items):"));

    let deleted = json_output(codelens(dir.path()).args(["--format", "json", "delete", "--id", &id]));
    assert_eq!(deleted["deleted"], 1);

    codelens(dir.path())
        .args(["get", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no chunk with id"));

    let stats = json_output(codelens(dir.path()).args(["--format", "json", "stats"]));
    assert_eq!(stats["total_chunks"], 2);
    assert_eq!(stats["chunk_types"]["class"], 1);

    let classes = json_output(codelens(dir.path()).args([
        "--format", "json", "search", "Bar", "--type", "class", "--threshold", "0",
    ]));
    let classes = classes.as_array().expect("array");
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0]["metadata"]["name"], "Bar");
    assert!(classes[0]["content"]
        .as_str()
        .expect("content")
        .contains("def baz(self, items):"));
}

#[test]
fn delete_requires_a_selector() {
    let dir = indexed_project();

    codelens(dir.path())
        .arg("delete")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to delete"));
}

#[test]
fn delete_by_file_leaves_other_files() {
    let dir = indexed_project();

    let deleted = json_output(codelens(dir.path()).args([
        "--format", "json", "delete", "--file", "src/b.py",
    ]));
    assert_eq!(deleted["deleted"], 2);

    let stats = json_output(codelens(dir.path()).args(["--format", "json", "stats"]));
    assert_eq!(stats["total_chunks"], 1);
}

#[test]
fn export_reset_import_restores_collection() {
    let dir = indexed_project();
    let export = dir.path().join("chunks.json");

    codelens(dir.path())
        .args(["export", export.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 3 chunks"));

    let records: Value = serde_json::from_str(&fs::read_to_string(&export).unwrap()).unwrap();
    let first = &records[0];
    assert!(first["id"].is_string());
    assert!(first["metadata"]["start_line"].is_u64());

    codelens(dir.path())
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 3 chunks"));

    codelens(dir.path())
        .args(["import", export.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 3 chunks"));

    let stats = json_output(codelens(dir.path()).args(["--format", "json", "stats"]));
    assert_eq!(stats["total_chunks"], 3);
}

#[test]
fn reindexing_a_file_replaces_its_chunks() {
    let dir = indexed_project();
    write_file(
        &dir.path().join("src/b.py"),
        "# moved down a line\nclass Bar:\n    def baz(self, items):\n        total = sum(item.weight for item in items)\n        return total * 2\n",
    );

    let stats = json_output(codelens(dir.path()).args([
        "--format", "json", "index", "--file", "src/b.py",
    ]));
    assert_eq!(stats["chunks_added"], 2);

    let stats = json_output(codelens(dir.path()).args(["--format", "json", "stats"]));
    assert_eq!(stats["total_chunks"], 3);
}

#[test]
fn completions_are_generated() {
    let dir = TempDir::new().unwrap();
    codelens(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("codelens"));
}

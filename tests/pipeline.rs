// SPDX-License-Identifier: MIT OR Apache-2.0

use codelens::embedding::HashingProvider;
use codelens::indexer::{IndexPipeline, NullObserver};
use codelens::retrieval::{RetrievalConfig, RetrievalEngine};
use codelens::store::{DistanceMetric, IndexStore, StoreConfig, DEFAULT_COLLECTION};
use codelens::{ChunkType, ChunkerConfig, CodeChunker, Language};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const A_PY: &str = "def foo(values):\n    return [value + 1 for value in values if value]\n";

const B_PY: &str = "class Bar:\n    def baz(self, items):\n        total = sum(item.weight for item in items)\n        return total * 2\n";

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, content).expect("write file");
}

fn project() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    write_file(&dir.path().join("a.py"), A_PY);
    write_file(&dir.path().join("b.py"), B_PY);
    dir
}

fn open_index(root: &Path) -> IndexStore {
    let config = StoreConfig {
        persist_directory: root.join(".codelens"),
        collection_name: DEFAULT_COLLECTION.to_string(),
        distance_metric: DistanceMetric::Cosine,
        batch_size: 100,
    };
    IndexStore::open(&config, Box::new(HashingProvider::new(384))).expect("open index")
}

fn pipeline() -> IndexPipeline {
    IndexPipeline::new(CodeChunker::new(ChunkerConfig::default()).expect("chunker"))
}

#[test]
fn two_file_project_yields_function_class_and_method() {
    let dir = project();
    let mut index = open_index(dir.path());

    let stats = pipeline()
        .index_directory(dir.path(), &mut index, &NullObserver)
        .expect("index");
    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.chunks_added, 3);
    assert_eq!(stats.errors, 0);
    assert_eq!(index.count().unwrap(), 3);

    let stats = index.statistics().unwrap();
    assert_eq!(stats.chunk_types.get("function"), Some(&1));
    assert_eq!(stats.chunk_types.get("class"), Some(&1));
    assert_eq!(stats.chunk_types.get("method"), Some(&1));
    assert_eq!(stats.languages.get("python"), Some(&3));

    let mut engine = RetrievalEngine::new(index, RetrievalConfig::default());
    let results = engine.search("baz method", Some(1), None, None).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name(), Some("baz"));
    assert_eq!(results[0].chunk_type(), Some("method"));
    assert_eq!(results[0].parent_context(), Some("Bar"));
    assert_eq!(results[0].file_path(), Some("b.py"));
    assert_eq!(results[0].rank, 1);
}

fn exported_ids(index: &IndexStore, path: &Path) -> Vec<String> {
    index.export_chunks(path).expect("export");
    let records: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    let mut ids: Vec<String> = records
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids
}

#[test]
fn reindexing_unchanged_files_is_idempotent() {
    let dir = project();
    let pipeline = pipeline();
    let mut index = open_index(dir.path());

    pipeline
        .index_directory(dir.path(), &mut index, &NullObserver)
        .expect("first pass");
    let first = exported_ids(&index, &dir.path().join("first.json"));

    pipeline
        .index_directory(dir.path(), &mut index, &NullObserver)
        .expect("second pass");
    let second = exported_ids(&index, &dir.path().join("second.json"));

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert_eq!(index.count().unwrap(), 3);
}

#[test]
fn store_survives_reopen() {
    let dir = project();
    {
        let mut index = open_index(dir.path());
        pipeline()
            .index_directory(dir.path(), &mut index, &NullObserver)
            .expect("index");
    }

    let index = open_index(dir.path());
    assert_eq!(index.count().unwrap(), 3);

    let chunker = CodeChunker::new(ChunkerConfig::default()).unwrap();
    let chunks = chunker.chunk_source(B_PY, "b.py", Language::Python).chunks;
    let method = chunks
        .iter()
        .find(|c| c.chunk_type == ChunkType::Method)
        .expect("method chunk");
    let stored = index.get_by_id(&method.chunk_id).unwrap().expect("stored");
    assert_eq!(stored, *method);
}

#[test]
fn every_admitted_chunk_respects_size_bounds() {
    let dir = TempDir::new().unwrap();
    let mut long_body = String::from("def long_one():\n");
    for i in 0..120 {
        long_body.push_str(&format!("    value_{i} = compute_something({i})\n"));
    }
    write_file(&dir.path().join("long.py"), &long_body);
    write_file(&dir.path().join("tiny.py"), "def t():\n    pass\n");
    write_file(&dir.path().join("notes.txt"), &"plain words ".repeat(400));
    write_file(&dir.path().join("a.py"), A_PY);

    let config = ChunkerConfig::new(50, 2000).unwrap();
    let pipeline = IndexPipeline::new(CodeChunker::new(config).unwrap())
        .with_extensions(&["py".to_string(), "txt".to_string()]);
    let mut index = open_index(dir.path());
    let stats = pipeline
        .index_directory(dir.path(), &mut index, &NullObserver)
        .unwrap();

    assert!(stats.chunks_rejected >= 2);
    assert_eq!(stats.files_fallback, 1);

    let export = dir.path().join("all.json");
    index.export_chunks(&export).unwrap();
    let records: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&export).unwrap()).unwrap();
    assert_eq!(records.len(), stats.chunks_added);
    for record in records {
        let len = record["content"].as_str().unwrap().chars().count();
        assert!((50..=2000).contains(&len), "chunk of {len} chars admitted");
    }
}

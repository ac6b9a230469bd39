// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chunk-level index over a vector store.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info, warn};

use super::backend::{QueryMatch, VectorRecord, VectorStore};
use super::filter::MetadataFilter;
use super::sqlite::SqliteVectorStore;
use super::{StoreConfig, DEFAULT_BATCH_SIZE, STATS_SAMPLE_SIZE};
use crate::chunk::{ChunkRecord, CodeChunk, SizeFilter};
use crate::chunker::{DEFAULT_MAX_CHUNK_SIZE, DEFAULT_MIN_CHUNK_SIZE};
use crate::embedding::EmbeddingProvider;
use crate::errors::{Error, Result};

/// Collection summary; histograms come from a bounded sample.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    pub total_chunks: usize,
    pub collection_name: String,
    pub embedding_model: String,
    pub distance_metric: String,
    pub chunk_types: BTreeMap<String, usize>,
    pub languages: BTreeMap<String, usize>,
}

/// Persistent chunk collection keyed by chunk id.
pub struct IndexStore {
    store: Box<dyn VectorStore>,
    embedder: Box<dyn EmbeddingProvider>,
    collection_name: String,
    batch_size: usize,
    size_filter: SizeFilter,
}

impl IndexStore {
    pub fn new(
        store: Box<dyn VectorStore>,
        embedder: Box<dyn EmbeddingProvider>,
        collection_name: impl Into<String>,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            collection_name: collection_name.into(),
            batch_size: if batch_size == 0 {
                DEFAULT_BATCH_SIZE
            } else {
                batch_size
            },
            size_filter: SizeFilter::new(DEFAULT_MIN_CHUNK_SIZE, DEFAULT_MAX_CHUNK_SIZE),
        }
    }

    /// Replaces the size bounds checked on every added or imported chunk.
    pub fn with_size_filter(mut self, size_filter: SizeFilter) -> Self {
        self.size_filter = size_filter;
        self
    }

    pub fn size_filter(&self) -> SizeFilter {
        self.size_filter
    }

    /// Opens the SQLite store described by `config`. Fails if the database
    /// cannot be opened.
    pub fn open(config: &StoreConfig, embedder: Box<dyn EmbeddingProvider>) -> Result<Self> {
        let store = SqliteVectorStore::open(
            config.database_path(),
            &config.collection_name,
            config.distance_metric,
        )?;
        Ok(Self::new(
            Box::new(store),
            embedder,
            config.collection_name.clone(),
            config.batch_size,
        ))
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn metric(&self) -> super::DistanceMetric {
        self.store.metric()
    }

    /// Upserts chunks in batches of `batch_size`; returns the number added.
    /// Chunks outside the size bounds are dropped.
    pub fn add(&mut self, chunks: &[CodeChunk], batch_size: usize) -> Result<usize> {
        self.add_with(chunks, batch_size, |_, _| {})
    }

    /// Like [`add`](Self::add), calling `on_batch(batch_index, size)` after
    /// each committed batch.
    pub fn add_with<F>(&mut self, chunks: &[CodeChunk], batch_size: usize, mut on_batch: F) -> Result<usize>
    where
        F: FnMut(usize, usize),
    {
        let records: Vec<ChunkRecord> = chunks
            .iter()
            .filter(|chunk| self.size_filter.accepts(chunk))
            .map(CodeChunk::to_record)
            .collect();
        let rejected = chunks.len() - records.len();
        if rejected > 0 {
            warn!(rejected, "dropped chunks outside size bounds");
        }
        let batch_size = batch_size.max(1);
        let mut total = 0;
        for (index, batch) in records.chunks(batch_size).enumerate() {
            total += self.upsert_records(batch)?;
            debug!(batch = index + 1, size = batch.len(), "added batch");
            on_batch(index, batch.len());
        }
        Ok(total)
    }

    fn upsert_records(&mut self, records: &[ChunkRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let texts: Vec<String> = records.iter().map(|r| r.content.clone()).collect();
        let embeddings = self.embedder.embed_texts(&texts)?;
        if embeddings.len() != records.len() {
            return Err(Error::Embedding(format!(
                "provider returned {} vectors for {} chunks",
                embeddings.len(),
                records.len()
            )));
        }

        let vectors: Vec<VectorRecord> = records
            .iter()
            .zip(embeddings)
            .map(|(record, embedding)| VectorRecord {
                id: record.id.clone(),
                content: record.content.clone(),
                metadata: record.metadata.clone(),
                embedding,
            })
            .collect();
        self.store.upsert(&vectors)
    }

    /// Embeds `text` and returns up to `n_results` matches by ascending
    /// distance. The retrieval engine asks for twice the results it will
    /// return to leave room for threshold filtering.
    pub fn query(
        &mut self,
        text: &str,
        n_results: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>> {
        if n_results == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed_one(text)?;
        self.store.query(&vector, n_results, filter)
    }

    pub fn delete_by_filter(&mut self, filter: &MetadataFilter) -> Result<usize> {
        let deleted = self.store.delete(filter)?;
        debug!(deleted, "deleted chunks by filter");
        Ok(deleted)
    }

    pub fn delete_by_file(&mut self, file_path: &str) -> Result<usize> {
        self.delete_by_filter(&MetadataFilter::by_file(file_path))
    }

    pub fn delete_ids(&mut self, ids: &[String]) -> Result<usize> {
        self.store.delete_ids(ids)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<CodeChunk>> {
        let mut records = self.store.get(&[id.to_string()])?;
        Ok(records.pop().map(CodeChunk::from_record))
    }

    /// Replaces the stored record for the chunk's id.
    pub fn update_chunk(&mut self, chunk: &CodeChunk) -> Result<()> {
        if !self.size_filter.accepts(chunk) {
            return Err(Error::Store(format!(
                "chunk {} has {} characters, outside the size bounds",
                chunk.chunk_id,
                chunk.char_len()
            )));
        }
        self.store.delete_ids(std::slice::from_ref(&chunk.chunk_id))?;
        self.add(std::slice::from_ref(chunk), 1)?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        self.store.count()
    }

    pub fn statistics(&self) -> Result<CollectionStats> {
        let total_chunks = self.store.count()?;
        let sample = self.store.scan(None, Some(STATS_SAMPLE_SIZE))?;

        let mut chunk_types = BTreeMap::new();
        let mut languages = BTreeMap::new();
        for record in &sample {
            let field = |key: &str| {
                record
                    .metadata
                    .get(key)
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string()
            };
            *chunk_types.entry(field("chunk_type")).or_insert(0) += 1;
            *languages.entry(field("language")).or_insert(0) += 1;
        }

        Ok(CollectionStats {
            total_chunks,
            collection_name: self.collection_name.clone(),
            embedding_model: self.embedder.model_id().to_string(),
            distance_metric: self.store.metric().to_string(),
            chunk_types,
            languages,
        })
    }

    /// Empties the collection.
    pub fn reset(&mut self) -> Result<()> {
        self.store.reset()?;
        info!(collection = %self.collection_name, "collection reset");
        Ok(())
    }

    /// Writes every record as a JSON array; returns the number exported.
    pub fn export_chunks(&self, path: &Path) -> Result<usize> {
        let records = self.store.scan(None, None)?;
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &records)?;
        info!(count = records.len(), path = %path.display(), "exported chunks");
        Ok(records.len())
    }

    /// Re-adds exported records under their stored ids; records outside the
    /// size bounds are dropped.
    pub fn import_chunks(&mut self, path: &Path) -> Result<usize> {
        let reader = BufReader::new(File::open(path)?);
        let records: Vec<ChunkRecord> = serde_json::from_reader(reader)?;
        let chunks: Vec<CodeChunk> = records.into_iter().map(CodeChunk::from_record).collect();
        let batch_size = self.batch_size;
        let added = self.add(&chunks, batch_size)?;
        info!(count = added, path = %path.display(), "imported chunks");
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkType;
    use crate::embedding::HashingProvider;
    use crate::parser::languages::Language;
    use crate::store::DistanceMetric;
    use tempfile::tempdir;

    fn index() -> IndexStore {
        let store = SqliteVectorStore::open_in_memory("code_intelligence", DistanceMetric::Cosine)
            .unwrap();
        IndexStore::new(
            Box::new(store),
            Box::new(HashingProvider::new(256)),
            "code_intelligence",
            100,
        )
        .with_size_filter(SizeFilter::new(10, 2000))
    }

    fn chunk(file: &str, line: usize, chunk_type: ChunkType, name: &str, body: &str) -> CodeChunk {
        CodeChunk::new(body.to_string(), chunk_type, Language::Python, file, line, line + 1)
            .with_name(Some(name.to_string()))
    }

    fn sample_chunks() -> Vec<CodeChunk> {
        vec![
            chunk("a.py", 0, ChunkType::Function, "load", "def load(path):\n    return open(path).read()"),
            chunk("b.py", 0, ChunkType::Class, "Parser", "class Parser:\n    pass"),
            chunk("b.py", 3, ChunkType::Function, "tokenize", "def tokenize(text):\n    return text.split()")
                .with_metadata("has_docstring", false),
        ]
    }

    #[test]
    fn test_add_in_batches_reports_each_batch() {
        let mut index = index();
        let mut batches = Vec::new();
        let added = index
            .add_with(&sample_chunks(), 2, |i, size| batches.push((i, size)))
            .unwrap();
        assert_eq!(added, 3);
        assert_eq!(batches, vec![(0, 2), (1, 1)]);
        assert_eq!(index.count().unwrap(), 3);
    }

    #[test]
    fn test_re_adding_same_chunks_is_idempotent() {
        let mut index = index();
        index.add(&sample_chunks(), 100).unwrap();
        index.add(&sample_chunks(), 100).unwrap();
        assert_eq!(index.count().unwrap(), 3);
    }

    #[test]
    fn test_get_by_id_restores_chunk() {
        let mut index = index();
        let chunks = sample_chunks();
        index.add(&chunks, 100).unwrap();

        let restored = index.get_by_id(&chunks[2].chunk_id).unwrap().unwrap();
        assert_eq!(restored, chunks[2]);
        assert!(index.get_by_id("python_function_000000000000").unwrap().is_none());
    }

    #[test]
    fn test_query_returns_ranked_candidates() {
        let mut index = index();
        index.add(&sample_chunks(), 100).unwrap();

        let matches = index.query("tokenize text split", 2, None).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].metadata["name"], "tokenize");
        assert!(matches[0].distance <= matches[1].distance);

        let filter = MetadataFilter::by_file("a.py");
        let matches = index.query("tokenize", 10, Some(&filter)).unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_delete_by_file_leaves_other_files() {
        let mut index = index();
        index.add(&sample_chunks(), 100).unwrap();
        assert_eq!(index.delete_by_file("b.py").unwrap(), 2);
        assert_eq!(index.count().unwrap(), 1);
    }

    #[test]
    fn test_update_chunk_replaces_record() {
        let mut index = index();
        let mut chunks = sample_chunks();
        index.add(&chunks, 100).unwrap();

        chunks[0].content.push_str("  # cached");
        index.update_chunk(&chunks[0]).unwrap();
        let restored = index.get_by_id(&chunks[0].chunk_id).unwrap().unwrap();
        assert!(restored.content.ends_with("# cached"));
        assert_eq!(index.count().unwrap(), 3);
    }

    #[test]
    fn test_statistics() {
        let mut index = index();
        index.add(&sample_chunks(), 100).unwrap();
        let stats = index.statistics().unwrap();
        assert_eq!(stats.total_chunks, 3);
        assert_eq!(stats.collection_name, "code_intelligence");
        assert_eq!(stats.embedding_model, "hashing-256");
        assert_eq!(stats.chunk_types["function"], 2);
        assert_eq!(stats.chunk_types["class"], 1);
        assert_eq!(stats.languages["python"], 3);
    }

    #[test]
    fn test_export_then_import_keeps_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chunks.json");

        let mut source = index();
        let chunks = sample_chunks();
        source.add(&chunks, 100).unwrap();
        assert_eq!(source.export_chunks(&path).unwrap(), 3);

        let exported: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(exported[1]["metadata"]["parent_context"], "");
        assert_eq!(exported[1]["metadata"]["start_line"], 0);

        let mut target = index();
        assert_eq!(target.import_chunks(&path).unwrap(), 3);
        for chunk in &chunks {
            assert_eq!(target.get_by_id(&chunk.chunk_id).unwrap().as_ref(), Some(chunk));
        }
    }

    #[test]
    fn test_add_drops_chunks_outside_bounds() {
        let mut index = index().with_size_filter(SizeFilter::new(30, 45));
        // Lengths 44, 22 and 43
        let added = index.add(&sample_chunks(), 100).unwrap();
        assert_eq!(added, 2);
        assert_eq!(index.count().unwrap(), 2);

        let short = chunk("c.py", 0, ChunkType::Function, "x", "x");
        assert!(matches!(index.update_chunk(&short), Err(Error::Store(_))));
    }

    #[test]
    fn test_import_drops_records_outside_bounds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chunks.json");
        let records = serde_json::json!([
            {"id": "python_function_aaaaaaaaaaaa", "content": "x",
             "metadata": {"chunk_type": "function", "language": "python", "file_path": "a.py",
                          "start_line": 0, "end_line": 0, "name": "x", "parent_context": ""}},
            {"id": "python_function_bbbbbbbbbbbb",
             "content": "def load(path):\n    return open(path).read()",
             "metadata": {"chunk_type": "function", "language": "python", "file_path": "a.py",
                          "start_line": 2, "end_line": 3, "name": "load", "parent_context": ""}}
        ]);
        std::fs::write(&path, records.to_string()).unwrap();

        let store = SqliteVectorStore::open_in_memory("code_intelligence", DistanceMetric::Cosine)
            .unwrap();
        let mut index = IndexStore::new(
            Box::new(store),
            Box::new(HashingProvider::new(64)),
            "code_intelligence",
            100,
        );
        assert_eq!(
            index.size_filter(),
            SizeFilter::new(DEFAULT_MIN_CHUNK_SIZE, DEFAULT_MAX_CHUNK_SIZE)
        );
        assert_eq!(index.import_chunks(&path).unwrap(), 0);
        assert_eq!(index.count().unwrap(), 0);

        let mut index = index.with_size_filter(SizeFilter::new(10, 2000));
        assert_eq!(index.import_chunks(&path).unwrap(), 1);
        assert!(index.get_by_id("python_function_aaaaaaaaaaaa").unwrap().is_none());
        assert!(index.get_by_id("python_function_bbbbbbbbbbbb").unwrap().is_some());
    }

    #[test]
    fn test_reset_empties_collection() {
        let mut index = index();
        index.add(&sample_chunks(), 100).unwrap();
        index.reset().unwrap();
        assert_eq!(index.count().unwrap(), 0);
        assert!(index.query("load", 5, None).unwrap().is_empty());
    }
}

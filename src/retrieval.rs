// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query-time retrieval.
//!
//! A search asks the [`IndexStore`] for `2 * top_k` candidates, converts each
//! distance to a similarity with the store's metric, drops candidates below
//! the threshold and truncates to `top_k`. Store order is never changed, and
//! each result keeps the 1-based rank the store gave it, so ranks may have
//! gaps after thresholding.

use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::debug;

use crate::chunk::ChunkType;
use crate::errors::Result;
use crate::parser::languages::Language;
use crate::store::{DistanceMetric, IndexStore, MetadataFilter, QueryMatch};

/// Results returned when no count is given.
pub const DEFAULT_TOP_K: usize = 8;

/// Minimum similarity kept when no threshold is given.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.1;

/// Resolved retrieval defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub similarity_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub similarity: f32,
    /// 1-based position in the store's candidate list
    pub rank: usize,
}

impl RetrievedChunk {
    fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn file_path(&self) -> Option<&str> {
        self.meta_str("file_path")
    }

    pub fn name(&self) -> Option<&str> {
        self.meta_str("name")
    }

    pub fn chunk_type(&self) -> Option<&str> {
        self.meta_str("chunk_type")
    }

    pub fn parent_context(&self) -> Option<&str> {
        self.meta_str("parent_context")
    }

    pub fn start_line(&self) -> Option<u64> {
        self.metadata.get("start_line").and_then(Value::as_u64)
    }

    pub fn end_line(&self) -> Option<u64> {
        self.metadata.get("end_line").and_then(Value::as_u64)
    }
}

/// Applies similarity conversion, thresholding and truncation to store
/// candidates already ordered by ascending distance.
pub fn rank_matches(
    matches: Vec<QueryMatch>,
    metric: DistanceMetric,
    top_k: usize,
    similarity_threshold: f32,
) -> Vec<RetrievedChunk> {
    matches
        .into_iter()
        .enumerate()
        .filter_map(|(index, m)| {
            let similarity = metric.similarity(m.distance);
            (similarity >= similarity_threshold).then(|| RetrievedChunk {
                chunk_id: m.id,
                content: m.content,
                metadata: m.metadata,
                similarity,
                rank: index + 1,
            })
        })
        .take(top_k)
        .collect()
}

/// Turns queries into ranked chunk lists.
pub struct RetrievalEngine {
    index: IndexStore,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    pub fn new(index: IndexStore, config: RetrievalConfig) -> Self {
        Self { index, config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn index(&self) -> &IndexStore {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut IndexStore {
        &mut self.index
    }

    pub fn into_index(self) -> IndexStore {
        self.index
    }

    /// Searches, optionally restricted to one language. `None` arguments use
    /// the configured defaults.
    pub fn search(
        &mut self,
        query: &str,
        top_k: Option<usize>,
        language: Option<Language>,
        similarity_threshold: Option<f32>,
    ) -> Result<Vec<RetrievedChunk>> {
        let filter = language.map(MetadataFilter::by_language);
        self.search_with_filter(query, top_k, filter.as_ref(), similarity_threshold)
    }

    pub fn search_with_filter(
        &mut self,
        query: &str,
        top_k: Option<usize>,
        filter: Option<&MetadataFilter>,
        similarity_threshold: Option<f32>,
    ) -> Result<Vec<RetrievedChunk>> {
        let top_k = top_k.unwrap_or(self.config.top_k);
        let threshold = similarity_threshold.unwrap_or(self.config.similarity_threshold);

        let started = Instant::now();
        let candidates = self.index.query(query, top_k.saturating_mul(2), filter)?;
        let candidate_count = candidates.len();
        let results = rank_matches(candidates, self.index.metric(), top_k, threshold);

        debug!(
            candidates = candidate_count,
            results = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search completed"
        );
        Ok(results)
    }

    pub fn search_by_file(
        &mut self,
        file_path: &str,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<RetrievedChunk>> {
        self.search_with_filter(query, top_k, Some(&MetadataFilter::by_file(file_path)), None)
    }

    pub fn search_by_language(
        &mut self,
        language: Language,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<RetrievedChunk>> {
        self.search(query, top_k, Some(language), None)
    }

    pub fn search_by_chunk_type(
        &mut self,
        chunk_type: ChunkType,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<RetrievedChunk>> {
        let filter = MetadataFilter::by_chunk_type(chunk_type);
        self.search_with_filter(query, top_k, Some(&filter), None)
    }

    /// Top-level functions only.
    pub fn search_functions(&mut self, query: &str, top_k: Option<usize>) -> Result<Vec<RetrievedChunk>> {
        self.search_by_chunk_type(ChunkType::Function, query, top_k)
    }

    pub fn search_classes(&mut self, query: &str, top_k: Option<usize>) -> Result<Vec<RetrievedChunk>> {
        self.search_by_chunk_type(ChunkType::Class, query, top_k)
    }

    /// Uses a code snippet as the query.
    pub fn find_similar_code(
        &mut self,
        snippet: &str,
        top_k: Option<usize>,
        language: Option<Language>,
    ) -> Result<Vec<RetrievedChunk>> {
        self.search(snippet, top_k, language, None)
    }
}

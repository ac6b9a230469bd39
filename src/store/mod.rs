// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chunk storage.
//!
//! [`IndexStore`] is the chunk-level facade used by indexing and retrieval. It
//! embeds chunk contents through an [`EmbeddingProvider`](crate::embedding::EmbeddingProvider)
//! and persists `(id, content, metadata, vector)` records in a [`VectorStore`].
//! [`SqliteVectorStore`] is the bundled backend.

pub mod backend;
pub mod filter;
pub mod index;
pub mod sqlite;

use std::path::PathBuf;

pub use backend::{DistanceMetric, QueryMatch, VectorRecord, VectorStore};
pub use filter::MetadataFilter;
pub use index::{CollectionStats, IndexStore};
pub use sqlite::SqliteVectorStore;

/// Default collection name.
pub const DEFAULT_COLLECTION: &str = "code_intelligence";

/// Chunks embedded and written per transaction.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Database file inside the persist directory.
pub const STORE_FILE: &str = "chunks.sqlite";

/// Records sampled for the statistics histograms.
pub const STATS_SAMPLE_SIZE: usize = 100;

/// Resolved store settings.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub persist_directory: PathBuf,
    pub collection_name: String,
    pub distance_metric: DistanceMetric,
    pub batch_size: usize,
}

impl StoreConfig {
    pub fn database_path(&self) -> PathBuf {
        self.persist_directory.join(STORE_FILE)
    }
}

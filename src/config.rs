// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for codelens
//!
//! Loads configuration from .codelensrc.toml in current directory or
//! ~/.config/codelens/config.toml. File values are all optional; the resolved
//! [`ChunkerConfig`], [`StoreConfig`] and [`RetrievalConfig`] values are built
//! once and handed to component constructors.

use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::chunker::{self, ChunkerConfig};
use crate::embedding::DEFAULT_EMBEDDING_DIM;
use crate::errors::{Error, Result};
use crate::retrieval::RetrievalConfig;
use crate::store::{DistanceMetric, StoreConfig};
use crate::utils::INDEX_DIR;

/// Name of the per-project configuration file
pub const CONFIG_FILE: &str = ".codelensrc.toml";

/// Embedding provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderType {
    /// In-process fastembed model
    #[default]
    Builtin,
    /// External command speaking JSON over stdin/stdout
    Command,
    /// Feature-hashing bag of words, no model required
    Hashing,
}

/// Chunking configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_by_functions: Option<bool>,
    pub chunk_by_classes: Option<bool>,
    pub chunk_by_methods: Option<bool>,
    pub include_docstrings: Option<bool>,
    pub include_imports: Option<bool>,
    /// Minimum chunk size in characters
    pub min_chunk_size: Option<usize>,
    /// Maximum chunk size in characters
    pub max_chunk_size: Option<usize>,
    /// Overlap between fallback text windows, in characters
    pub overlap_size: Option<usize>,
    /// Files larger than this are skipped
    pub max_file_bytes: Option<usize>,
}

impl ChunkingConfig {
    /// Resolves defaults and validates the size bounds.
    pub fn resolve(&self) -> Result<ChunkerConfig> {
        let defaults = ChunkerConfig::default();
        ChunkerConfig {
            chunk_by_functions: self.chunk_by_functions.unwrap_or(defaults.chunk_by_functions),
            chunk_by_classes: self.chunk_by_classes.unwrap_or(defaults.chunk_by_classes),
            chunk_by_methods: self.chunk_by_methods.unwrap_or(defaults.chunk_by_methods),
            include_docstrings: self.include_docstrings.unwrap_or(defaults.include_docstrings),
            include_imports: self.include_imports.unwrap_or(defaults.include_imports),
            min_chunk_size: self.min_chunk_size.unwrap_or(chunker::DEFAULT_MIN_CHUNK_SIZE),
            max_chunk_size: self.max_chunk_size.unwrap_or(chunker::DEFAULT_MAX_CHUNK_SIZE),
            overlap_size: self.overlap_size.unwrap_or(chunker::DEFAULT_OVERLAP_SIZE),
            max_file_bytes: self.max_file_bytes.unwrap_or(chunker::DEFAULT_MAX_FILE_BYTES),
        }
        .validated()
    }
}

/// Chunk store configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Directory holding the store, relative to the indexed root
    pub persist_directory: Option<String>,
    pub collection_name: Option<String>,
    pub distance_metric: Option<DistanceMetric>,
    /// Chunks embedded and written per transaction
    pub batch_size: Option<usize>,
}

impl StoreSection {
    /// Get persist directory (defaults to ".codelens")
    pub fn persist_directory(&self) -> &str {
        self.persist_directory.as_deref().unwrap_or(INDEX_DIR)
    }

    /// Get collection name (defaults to "code_intelligence")
    pub fn collection_name(&self) -> &str {
        self.collection_name
            .as_deref()
            .unwrap_or(crate::store::DEFAULT_COLLECTION)
    }

    /// Get distance metric (defaults to cosine)
    pub fn distance_metric(&self) -> DistanceMetric {
        self.distance_metric.unwrap_or_default()
    }

    /// Get batch size (defaults to 100)
    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(crate::store::DEFAULT_BATCH_SIZE)
    }

    /// Resolves the store location under `root`.
    pub fn resolve(&self, root: &Path) -> Result<StoreConfig> {
        if self.batch_size() == 0 {
            return Err(Error::InvalidConfig(
                "store.batch_size must be greater than 0".to_string(),
            ));
        }
        Ok(StoreConfig {
            persist_directory: root.join(self.persist_directory()),
            collection_name: self.collection_name().to_string(),
            distance_metric: self.distance_metric(),
            batch_size: self.batch_size(),
        })
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RetrievalSection {
    pub top_k: Option<usize>,
    pub similarity_threshold: Option<f32>,
}

impl RetrievalSection {
    pub fn resolve(&self) -> Result<RetrievalConfig> {
        let defaults = RetrievalConfig::default();
        let config = RetrievalConfig {
            top_k: self.top_k.unwrap_or(defaults.top_k),
            similarity_threshold: self
                .similarity_threshold
                .unwrap_or(defaults.similarity_threshold),
        };
        if config.top_k == 0 {
            return Err(Error::InvalidConfig(
                "retrieval.top_k must be greater than 0".to_string(),
            ));
        }
        Ok(config)
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider type (builtin, command, hashing)
    pub provider: Option<EmbeddingProviderType>,
    /// Model identifier for the embedding provider
    pub model: Option<String>,
    /// Command to execute for command provider
    pub command: Option<String>,
    /// Seconds before the command provider is killed
    pub timeout_secs: Option<u64>,
    /// Vector size of the hashing provider
    pub dimension: Option<usize>,
}

impl EmbeddingConfig {
    /// Get provider type (defaults to Builtin)
    pub fn provider(&self) -> EmbeddingProviderType {
        self.provider.unwrap_or_default()
    }

    /// Get model identifier (defaults to "all-minilm-l6-v2")
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or("all-minilm-l6-v2")
    }

    /// Get command (defaults to "embedder")
    pub fn command(&self) -> &str {
        self.command.as_deref().unwrap_or("embedder")
    }

    /// Get command timeout (defaults to 30 seconds)
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(30)
    }

    /// Get hashing dimension (defaults to 384)
    pub fn dimension(&self) -> usize {
        self.dimension.unwrap_or(DEFAULT_EMBEDDING_DIM)
    }
}

/// Indexing configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Extensions to index; empty means every file with a known language
    pub extensions: Vec<String>,
    /// Directory names skipped during the scan, on top of .gitignore rules
    pub exclude_dirs: Vec<String>,
}

impl IndexConfig {
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn exclude_dirs(&self) -> &[String] {
        &self.exclude_dirs
    }
}

/// Configuration loaded from .codelensrc.toml or ~/.config/codelens/config.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub retrieval: RetrievalSection,

    #[serde(default)]
    pub embeddings: EmbeddingConfig,

    #[serde(default)]
    pub index: IndexConfig,
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .codelensrc.toml in current directory
    /// 2. ~/.config/codelens/config.toml
    pub fn load() -> Self {
        Self::load_in(Path::new("."))
    }

    /// Like [`load`](Self::load), looking for `.codelensrc.toml` in `dir`.
    pub fn load_in(dir: &Path) -> Self {
        if let Some(config) = Self::load_from_path(&dir.join(CONFIG_FILE)) {
            return config;
        }

        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("codelens").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match Self::from_toml(&content) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded configuration");
                Some(config)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse configuration");
                None
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn chunker_config(&self) -> Result<ChunkerConfig> {
        self.chunking.resolve()
    }

    pub fn store_config(&self, root: &Path) -> Result<StoreConfig> {
        self.store.resolve(root)
    }

    pub fn retrieval_config(&self) -> Result<RetrievalConfig> {
        self.retrieval.resolve()
    }

    pub fn embeddings(&self) -> &EmbeddingConfig {
        &self.embeddings
    }

    pub fn index(&self) -> &IndexConfig {
        &self.index
    }
}

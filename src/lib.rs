// SPDX-License-Identifier: MIT OR Apache-2.0

//! codelens - AST-aware code chunking and semantic retrieval
//!
//! Source files are decomposed into identity-stable chunks by walking their
//! tree-sitter syntax trees ([`chunker`], [`extract`]), embedded and stored in
//! a chunk index ([`store`]), and retrieved by similarity ([`retrieval`]).
//! [`indexer`] drives whole-codebase indexing.

pub mod chunk;
pub mod chunker;
pub mod config;
pub mod embedding;
pub mod errors;
pub mod extract;
pub mod indexer;
pub mod output;
pub mod parser;
pub mod retrieval;
pub mod store;
pub mod utils;

pub use chunk::{ChunkType, CodeChunk};
pub use chunker::{ChunkerConfig, CodeChunker};
pub use errors::{Error, Result};
pub use indexer::{IndexObserver, IndexPipeline, IndexingStats};
pub use parser::Language;
pub use retrieval::{RetrievalConfig, RetrievalEngine, RetrievedChunk};
pub use store::{IndexStore, MetadataFilter};

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by the chunking, storage and retrieval layers.

use std::time::Duration;

/// Errors raised by the codelens library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error reading source files or writing exports.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite chunk store error.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration values are inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Tree-sitter could not produce an error-free tree.
    #[error("parse failed for {path}: {reason}")]
    Parse { path: String, reason: String },

    /// No grammar is registered for the language.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The embedding provider failed.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// The embedding provider did not answer in time.
    #[error("embedding request timed out after {0:?}")]
    EmbeddingTimeout(Duration),

    /// The vector store rejected an operation.
    #[error("store error: {0}")]
    Store(String),
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Raised by the CLI when no chunk store exists yet for a directory.
#[derive(Debug, thiserror::Error)]
#[error("no index found at {path}. Run 'codelens index' first.")]
pub struct IndexNotFoundError {
    pub path: String,
}

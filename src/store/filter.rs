// SPDX-License-Identifier: MIT OR Apache-2.0

//! Equality filters over stored chunk metadata.

use serde_json::Value;

use crate::chunk::ChunkType;
use crate::parser::languages::Language;

/// Conjunction of `metadata[key] == value` predicates.
///
/// Values are strings, integers or booleans; an empty filter matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    conditions: Vec<(String, Value)>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality predicate.
    pub fn equals(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((key.into(), value.into()));
        self
    }

    pub fn by_file(file_path: impl Into<String>) -> Self {
        Self::new().equals("file_path", file_path.into())
    }

    pub fn by_language(language: Language) -> Self {
        Self::new().equals("language", language.id())
    }

    pub fn by_chunk_type(chunk_type: ChunkType) -> Self {
        Self::new().equals("chunk_type", chunk_type.as_str())
    }

    /// Combines two filters.
    pub fn and(mut self, other: MetadataFilter) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }
}

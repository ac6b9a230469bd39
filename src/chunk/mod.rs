// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chunk data model.
//!
//! A [`CodeChunk`] is the unit of indexing and retrieval: one function, method,
//! class, import statement, or fallback text window, together with its span
//! and a content-addressed identifier.

pub mod filter;
pub mod identity;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::parser::languages::Language;

pub use filter::SizeFilter;
pub use identity::ChunkIdentity;

/// Kind of source region a chunk covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Function,
    Method,
    Class,
    Import,
    TextBlock,
}

impl ChunkType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChunkType::Function => "function",
            ChunkType::Method => "method",
            ChunkType::Class => "class",
            ChunkType::Import => "import",
            ChunkType::TextBlock => "text_block",
        }
    }
}

impl std::fmt::Display for ChunkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChunkType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "function" => Ok(ChunkType::Function),
            "method" => Ok(ChunkType::Method),
            "class" => Ok(ChunkType::Class),
            "import" => Ok(ChunkType::Import),
            "text_block" | "text" => Ok(ChunkType::TextBlock),
            _ => Err(format!("Unknown chunk type: {}", s)),
        }
    }
}

/// A semantically bounded unit of source text.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeChunk {
    /// Exact source text, whole lines `start_line..=end_line`
    pub content: String,
    pub chunk_type: ChunkType,
    pub language: Language,
    /// Originating file, used as partition key
    pub file_path: String,
    /// Zero-based first line
    pub start_line: usize,
    /// Zero-based last line (inclusive)
    pub end_line: usize,
    /// Function/class identifier
    pub name: Option<String>,
    /// Enclosing class name, set only for methods
    pub parent_context: Option<String>,
    /// Auxiliary facts, flattened into the stored metadata
    pub metadata: Map<String, Value>,
    /// Derived once at construction, see [`ChunkIdentity`]
    pub chunk_id: String,
}

impl CodeChunk {
    /// Creates a chunk and derives its identifier.
    pub fn new(
        content: String,
        chunk_type: ChunkType,
        language: Language,
        file_path: impl Into<String>,
        start_line: usize,
        end_line: usize,
    ) -> Self {
        let file_path = file_path.into();
        let chunk_id =
            ChunkIdentity::compute(language, chunk_type, &file_path, start_line, &content);
        Self {
            content,
            chunk_type,
            language,
            file_path,
            start_line,
            end_line,
            name: None,
            parent_context: None,
            metadata: Map::new(),
            chunk_id,
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn with_parent_context(mut self, parent: Option<String>) -> Self {
        self.parent_context = parent;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Content length in characters, the unit used by size bounds.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Flattened metadata as persisted next to the chunk content.
    ///
    /// Absent `name`/`parent_context` are stored as empty strings.
    pub fn store_metadata(&self) -> Map<String, Value> {
        let mut meta = Map::new();
        meta.insert("chunk_type".into(), self.chunk_type.as_str().into());
        meta.insert("language".into(), self.language.id().into());
        meta.insert("file_path".into(), self.file_path.clone().into());
        meta.insert("start_line".into(), self.start_line.into());
        meta.insert("end_line".into(), self.end_line.into());
        meta.insert("name".into(), self.name.clone().unwrap_or_default().into());
        meta.insert(
            "parent_context".into(),
            self.parent_context.clone().unwrap_or_default().into(),
        );
        for (key, value) in &self.metadata {
            meta.entry(key.clone()).or_insert_with(|| value.clone());
        }
        meta
    }

    /// Rebuilds a chunk from a stored record, keeping the stored id.
    pub fn from_record(record: ChunkRecord) -> Self {
        let ChunkRecord {
            id,
            content,
            mut metadata,
        } = record;

        let text = |meta: &mut Map<String, Value>, key: &str| -> Option<String> {
            match meta.remove(key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s),
                _ => None,
            }
        };
        let line = |meta: &mut Map<String, Value>, key: &str| -> usize {
            meta.remove(key)
                .and_then(|v| v.as_u64())
                .map(|v| v as usize)
                .unwrap_or(0)
        };

        let chunk_type = text(&mut metadata, "chunk_type")
            .and_then(|s| s.parse().ok())
            .unwrap_or(ChunkType::TextBlock);
        let language = text(&mut metadata, "language")
            .map(|s| Language::from_id(&s))
            .unwrap_or(Language::Unknown);
        let file_path = text(&mut metadata, "file_path").unwrap_or_default();
        let start_line = line(&mut metadata, "start_line");
        let end_line = line(&mut metadata, "end_line");
        let name = text(&mut metadata, "name");
        let parent_context = text(&mut metadata, "parent_context");

        Self {
            content,
            chunk_type,
            language,
            file_path,
            start_line,
            end_line,
            name,
            parent_context,
            metadata,
            chunk_id: id,
        }
    }

    /// Interchange record for export.
    pub fn to_record(&self) -> ChunkRecord {
        ChunkRecord {
            id: self.chunk_id.clone(),
            content: self.content.clone(),
            metadata: self.store_metadata(),
        }
    }

    /// Short `type:name` label used in logs and CLI output.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{}:{}", self.chunk_type, name),
            None => self.chunk_type.to_string(),
        }
    }
}

/// Persisted/exported chunk record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
}

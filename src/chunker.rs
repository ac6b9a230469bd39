// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-file chunking.
//!
//! A file is decoded, its language detected from the extension, parsed with
//! the matching grammar and handed to the language's extractor. Files without
//! an extractor, and files whose tree contains syntax errors, are cut into
//! character windows instead. Every candidate then goes through the same
//! [`SizeFilter`].

use std::path::Path;

use tracing::{debug, warn};
use tree_sitter::Tree;

use crate::chunk::{CodeChunk, SizeFilter};
use crate::errors::{Error, Result};
use crate::extract::{ExtractorRegistry, WindowChunker};
use crate::parser::languages::{GrammarAdapter, Language, GRAMMARS};
use crate::parser::text::split_lines;

/// Minimum chunk size in characters.
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 50;

/// Maximum chunk size in characters.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 2000;

/// Characters repeated between consecutive fallback windows.
pub const DEFAULT_OVERLAP_SIZE: usize = 0;

/// Files larger than this are skipped.
pub const DEFAULT_MAX_FILE_BYTES: usize = 2_000_000;

/// Bytes inspected when sniffing for binary content.
const BINARY_SNIFF_LEN: usize = 8000;

/// Chunking options, fixed for the lifetime of a [`CodeChunker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub chunk_by_functions: bool,
    pub chunk_by_classes: bool,
    pub chunk_by_methods: bool,
    pub include_docstrings: bool,
    pub include_imports: bool,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
    pub overlap_size: usize,
    pub max_file_bytes: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_by_functions: true,
            chunk_by_classes: true,
            chunk_by_methods: true,
            include_docstrings: true,
            include_imports: true,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            overlap_size: DEFAULT_OVERLAP_SIZE,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl ChunkerConfig {
    /// Default options with the given size bounds.
    pub fn new(min_chunk_size: usize, max_chunk_size: usize) -> Result<Self> {
        Self {
            min_chunk_size,
            max_chunk_size,
            ..Default::default()
        }
        .validated()
    }

    pub fn with_overlap(mut self, overlap_size: usize) -> Result<Self> {
        self.overlap_size = overlap_size;
        self.validated()
    }

    pub fn with_max_file_bytes(mut self, size: usize) -> Self {
        self.max_file_bytes = size;
        self
    }

    /// Bounds admitted chunks must fall within.
    pub fn size_filter(&self) -> SizeFilter {
        SizeFilter::new(self.min_chunk_size, self.max_chunk_size)
    }

    /// Checks the size bounds are consistent.
    pub fn validated(self) -> Result<Self> {
        if self.max_chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "max_chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.min_chunk_size > self.max_chunk_size {
            return Err(Error::InvalidConfig(format!(
                "min_chunk_size ({}) must not exceed max_chunk_size ({})",
                self.min_chunk_size, self.max_chunk_size
            )));
        }
        if self.overlap_size >= self.max_chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap_size ({}) must be less than max_chunk_size ({})",
                self.overlap_size, self.max_chunk_size
            )));
        }
        Ok(self)
    }
}

/// Outcome of chunking a single file.
#[derive(Debug, Default)]
pub struct FileChunks {
    /// Admitted chunks in document order
    pub chunks: Vec<CodeChunk>,
    /// Candidates dropped by the size filter
    pub rejected: usize,
    /// Whether the fallback windows were used
    pub fallback: bool,
    /// Parse failure that triggered the fallback, if any
    pub parse_error: Option<Error>,
    /// Skipped as too large or binary
    pub skipped: bool,
}

/// Turns source files into size-bounded chunks.
pub struct CodeChunker {
    config: ChunkerConfig,
    extractors: ExtractorRegistry,
    filter: SizeFilter,
    windows: WindowChunker,
}

impl CodeChunker {
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        Self::with_extractors(config, ExtractorRegistry::new())
    }

    pub fn with_extractors(config: ChunkerConfig, extractors: ExtractorRegistry) -> Result<Self> {
        let config = config.validated()?;
        Ok(Self {
            filter: config.size_filter(),
            windows: WindowChunker::new(config.max_chunk_size, config.overlap_size),
            extractors,
            config,
        })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunks a file, recording its path as given.
    pub fn chunk_file(&self, path: &Path) -> Result<FileChunks> {
        self.chunk_file_as(path, &path.to_string_lossy())
    }

    /// Chunks the file at `path`, recording `file_path` on every chunk.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn chunk_file_as(&self, path: &Path, file_path: &str) -> Result<FileChunks> {
        let bytes = std::fs::read(path)?;
        if bytes.len() > self.config.max_file_bytes {
            debug!(file = file_path, size = bytes.len(), "skipping large file");
            return Ok(FileChunks {
                skipped: true,
                ..Default::default()
            });
        }
        if is_binary(&bytes) {
            debug!(file = file_path, "skipping binary file");
            return Ok(FileChunks {
                skipped: true,
                ..Default::default()
            });
        }

        let source = String::from_utf8_lossy(&bytes);
        Ok(self.chunk_source(&source, file_path, Language::detect(path)))
    }

    /// Chunks in-memory source.
    pub fn chunk_source(&self, source: &str, file_path: &str, language: Language) -> FileChunks {
        let mut result = FileChunks::default();

        let extracted = match self.extractors.get(language) {
            Some(extractor) => match self.parse(language, source, file_path) {
                Ok(tree) => {
                    let lines = split_lines(source);
                    Some(extractor.extract(&tree, &lines, file_path, &self.config))
                }
                Err(e) => {
                    warn!(file = file_path, error = %e, "parse failed, using text windows");
                    result.parse_error = Some(e);
                    None
                }
            },
            None => {
                debug!(file = file_path, language = %language, "no extractor, using text windows");
                None
            }
        };

        result.chunks = match extracted {
            Some(chunks) => chunks,
            None => {
                result.fallback = true;
                self.windows.chunk(source, file_path, language)
            }
        };
        result.rejected = self.filter.retain(&mut result.chunks);

        debug!(
            file = file_path,
            chunks = result.chunks.len(),
            rejected = result.rejected,
            fallback = result.fallback,
            "chunked file"
        );
        result
    }

    fn parse(&self, language: Language, source: &str, file_path: &str) -> Result<Tree> {
        let tsx = language == Language::TypeScript
            && Path::new(file_path)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("tsx"));
        let parsed = if tsx {
            GRAMMARS.parse_tsx(source)
        } else {
            GRAMMARS.parse(language, source)
        };
        parsed.map_err(|e| match e {
            Error::Parse { reason, .. } => Error::Parse {
                path: file_path.to_string(),
                reason,
            },
            other => other,
        })
    }
}

fn is_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(BINARY_SNIFF_LEN).any(|b| *b == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkType;
    use std::fs;
    use tempfile::TempDir;

    const FOO: &str = "def foo(values):\n    \"\"\"Sum the values.\"\"\"\n    return sum(values)\n";

    #[test]
    fn test_default_config() {
        let config = ChunkerConfig::default();
        assert_eq!(config.min_chunk_size, 50);
        assert_eq!(config.max_chunk_size, 2000);
        assert_eq!(config.overlap_size, 0);
        assert!(config.chunk_by_methods);
    }

    #[test]
    fn test_config_validation() {
        assert!(ChunkerConfig::new(50, 2000).is_ok());
        assert!(ChunkerConfig::new(10, 10).is_ok());
        assert!(matches!(
            ChunkerConfig::new(100, 50),
            Err(Error::InvalidConfig(_))
        ));
        assert!(ChunkerConfig::new(0, 0).is_err());
        assert!(ChunkerConfig::default().with_overlap(2000).is_err());
        assert!(ChunkerConfig::default().with_overlap(200).is_ok());
    }

    #[test]
    fn test_python_source_is_chunked_structurally() {
        let chunker = CodeChunker::new(ChunkerConfig::default()).unwrap();
        let result = chunker.chunk_source(FOO, "a.py", Language::Python);
        assert!(!result.fallback);
        assert_eq!(result.chunks.len(), 1);
        assert_eq!(result.chunks[0].label(), "function:foo");
        assert_eq!(result.chunks[0].file_path, "a.py");
    }

    #[test]
    fn test_syntax_error_falls_back() {
        let chunker = CodeChunker::new(ChunkerConfig::new(1, 2000).unwrap()).unwrap();
        let source = "def broken(:\n    return 1\n";
        let result = chunker.chunk_source(source, "broken.py", Language::Python);
        assert!(result.fallback);
        assert!(result.parse_error.unwrap().to_string().contains("broken.py"));
        assert_eq!(result.chunks.len(), 1);
        assert_eq!(result.chunks[0].chunk_type, ChunkType::TextBlock);
        assert_eq!(result.chunks[0].language, Language::Python);
    }

    #[test]
    fn test_unknown_language_uses_windows() {
        let chunker = CodeChunker::new(ChunkerConfig::new(10, 100).unwrap()).unwrap();
        let source = "z".repeat(300);
        let result = chunker.chunk_source(&source, "data.bin.txt", Language::Unknown);
        assert!(result.fallback);
        assert!(result.parse_error.is_none());
        assert_eq!(result.chunks.len(), 3);
        assert!(result.chunks.iter().all(|c| c.char_len() == 100));
    }

    #[test]
    fn test_size_filter_applies_to_every_chunk() {
        let chunker = CodeChunker::new(ChunkerConfig::new(60, 2000).unwrap()).unwrap();
        let source = "import os\n\ndef tiny():\n    pass\n\ndef larger(a, b):\n    total = a + b\n    return total * total\n";
        let result = chunker.chunk_source(source, "m.py", Language::Python);
        assert_eq!(result.rejected, 2);
        assert_eq!(result.chunks.len(), 1);
        assert!(result
            .chunks
            .iter()
            .all(|c| (60..=2000).contains(&c.char_len())));
    }

    #[test]
    fn test_tsx_files_use_jsx_grammar() {
        let chunker = CodeChunker::new(ChunkerConfig::new(1, 2000).unwrap()).unwrap();
        let source = "export function Hello(props: { name: string }) {\n  return <div>{props.name}</div>;\n}\n";
        let result = chunker.chunk_source(source, "Hello.tsx", Language::TypeScript);
        assert!(!result.fallback);
        assert_eq!(result.chunks[0].label(), "function:Hello");
    }

    #[test]
    fn test_chunk_file_detects_language_and_skips_large() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.py");
        fs::write(&path, FOO).unwrap();

        let chunker = CodeChunker::new(ChunkerConfig::default()).unwrap();
        let result = chunker.chunk_file_as(&path, "a.py").unwrap();
        assert_eq!(result.chunks[0].language, Language::Python);

        let small = CodeChunker::new(ChunkerConfig::default().with_max_file_bytes(10)).unwrap();
        let result = small.chunk_file(&path).unwrap();
        assert!(result.skipped);
        assert!(result.chunks.is_empty());
    }

    #[test]
    fn test_binary_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.c");
        fs::write(&path, b"int x;\0\0\0").unwrap();
        let chunker = CodeChunker::new(ChunkerConfig::default()).unwrap();
        assert!(chunker.chunk_file(&path).unwrap().skipped);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let chunker = CodeChunker::new(ChunkerConfig::default()).unwrap();
        let result = chunker.chunk_file(Path::new("/nonexistent/x.py"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structural chunk extraction from tree-sitter syntax trees.
//!
//! Every language implements [`LanguageExtractor`] by describing its node
//! taxonomy (which node kinds are class-like, function-like and import-like)
//! and, where needed, overriding the naming hooks. The traversal itself is
//! shared: an iterative depth-first walk over an explicit stack of
//! `(node, enclosing_class)` frames, so deeply nested or generated sources
//! cannot exhaust the call stack.

pub mod c;
pub mod fallback;
pub mod go;
pub mod java;
pub mod javascript;
pub mod python;
pub mod ruby;
pub mod rust;

use std::collections::HashMap;
use tree_sitter::{Node, Tree};

use crate::chunk::{ChunkType, CodeChunk};
use crate::chunker::ChunkerConfig;
use crate::parser::languages::Language;
use crate::parser::text::{end_row, node_content, node_text};

pub use fallback::WindowChunker;

/// Name recorded as parent context for classes without an identifier.
pub const ANONYMOUS: &str = "anonymous";

/// Node kinds that drive chunk boundaries for one grammar.
#[derive(Debug)]
pub struct NodeTaxonomy {
    pub class_kinds: &'static [&'static str],
    pub function_kinds: &'static [&'static str],
    pub import_kinds: &'static [&'static str],
}

impl NodeTaxonomy {
    pub fn is_class(&self, kind: &str) -> bool {
        self.class_kinds.contains(&kind)
    }

    pub fn is_function(&self, kind: &str) -> bool {
        self.function_kinds.contains(&kind)
    }

    pub fn is_import(&self, kind: &str) -> bool {
        self.import_kinds.contains(&kind)
    }
}

/// Per-language chunk extraction.
pub trait LanguageExtractor: Send + Sync {
    fn language(&self) -> Language;

    fn taxonomy(&self) -> &'static NodeTaxonomy;

    /// Symbol name of a class or function node.
    fn symbol_name(&self, node: Node<'_>, lines: &[&str]) -> Option<String> {
        field_text(node, "name", lines)
    }

    /// Docstring placed as the first statement of a function body.
    fn docstring(&self, _node: Node<'_>, _lines: &[&str]) -> Option<String> {
        None
    }

    /// Receiver type for methods declared outside any class body (Go).
    fn receiver(&self, _node: Node<'_>, _lines: &[&str]) -> Option<String> {
        None
    }

    /// Whether a direct child of the root is an import statement.
    fn is_import(&self, node: Node<'_>, _lines: &[&str]) -> bool {
        self.taxonomy().is_import(node.kind())
    }

    /// Renders a docstring missing from the extracted content.
    fn prepend_docstring(&self, docstring: &str, content: &str) -> String {
        format!("\"\"\"{}\"\"\"\n{}", docstring, content)
    }

    /// Emits import chunks followed by class, method and function chunks in
    /// document order. Size bounds are not applied here.
    fn extract(
        &self,
        tree: &Tree,
        lines: &[&str],
        file_path: &str,
        config: &ChunkerConfig,
    ) -> Vec<CodeChunk> {
        let root = tree.root_node();
        let mut chunks = Vec::new();
        if config.include_imports {
            chunks.extend(extract_imports(self, root, lines, file_path));
        }
        chunks.extend(walk(self, root, lines, file_path, config));
        chunks
    }
}

/// Traversal state: a node and the class it is nested in, if any.
struct Frame<'t> {
    node: Node<'t>,
    enclosing_class: Option<String>,
}

fn walk<E: LanguageExtractor + ?Sized>(
    extractor: &E,
    root: Node<'_>,
    lines: &[&str],
    file_path: &str,
    config: &ChunkerConfig,
) -> Vec<CodeChunk> {
    let taxonomy = extractor.taxonomy();
    let language = extractor.language();
    let mut chunks = Vec::new();
    let mut cursor = root.walk();
    let mut stack = vec![Frame {
        node: root,
        enclosing_class: None,
    }];

    while let Some(Frame {
        node,
        enclosing_class,
    }) = stack.pop()
    {
        let kind = node.kind();

        let child_class = if taxonomy.is_class(kind) {
            let name = extractor.symbol_name(node, lines);
            if config.chunk_by_classes {
                chunks.push(
                    CodeChunk::new(
                        node_content(node, lines),
                        ChunkType::Class,
                        language,
                        file_path,
                        node.start_position().row,
                        end_row(node),
                    )
                    .with_name(name.clone()),
                );
            }
            Some(name.unwrap_or_else(|| ANONYMOUS.to_string()))
        } else if taxonomy.is_function(kind) {
            let parent = enclosing_class.or_else(|| extractor.receiver(node, lines));
            if let Some(chunk) = function_chunk(extractor, node, lines, file_path, parent, config)
            {
                chunks.push(chunk);
            }
            // Definitions nested inside a function body are not methods.
            None
        } else {
            enclosing_class
        };

        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            stack.push(Frame {
                node: child,
                enclosing_class: child_class.clone(),
            });
        }
    }

    chunks
}

fn function_chunk<E: LanguageExtractor + ?Sized>(
    extractor: &E,
    node: Node<'_>,
    lines: &[&str],
    file_path: &str,
    parent: Option<String>,
    config: &ChunkerConfig,
) -> Option<CodeChunk> {
    let chunk_type = if parent.is_some() {
        if !config.chunk_by_methods {
            return None;
        }
        ChunkType::Method
    } else {
        if !config.chunk_by_functions {
            return None;
        }
        ChunkType::Function
    };

    let mut content = node_content(node, lines);
    let docstring = if config.include_docstrings {
        extractor.docstring(node, lines)
    } else {
        None
    };
    if let Some(doc) = docstring.as_deref() {
        if !content.contains(doc) {
            content = extractor.prepend_docstring(doc, &content);
        }
    }

    Some(
        CodeChunk::new(
            content,
            chunk_type,
            extractor.language(),
            file_path,
            node.start_position().row,
            end_row(node),
        )
        .with_name(extractor.symbol_name(node, lines))
        .with_parent_context(parent)
        .with_metadata("has_docstring", docstring.is_some()),
    )
}

/// Import statements among the direct children of the root only.
fn extract_imports<E: LanguageExtractor + ?Sized>(
    extractor: &E,
    root: Node<'_>,
    lines: &[&str],
    file_path: &str,
) -> Vec<CodeChunk> {
    let mut cursor = root.walk();
    root.named_children(&mut cursor)
        .filter(|node| extractor.is_import(*node, lines))
        .map(|node| {
            CodeChunk::new(
                node_content(node, lines),
                ChunkType::Import,
                extractor.language(),
                file_path,
                node.start_position().row,
                end_row(node),
            )
        })
        .collect()
}

/// Span-exact text of a named field, if present and non-empty.
pub(crate) fn field_text(node: Node<'_>, field: &str, lines: &[&str]) -> Option<String> {
    node.child_by_field_name(field)
        .map(|child| node_text(child, lines))
        .filter(|text| !text.is_empty())
}

/// Extractors keyed by language.
pub struct ExtractorRegistry {
    extractors: HashMap<Language, Box<dyn LanguageExtractor>>,
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorRegistry {
    /// Registry with every built-in extractor.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(python::PythonExtractor));
        registry.register(Box::new(javascript::JavaScriptExtractor));
        registry.register(Box::new(javascript::TypeScriptExtractor));
        registry.register(Box::new(java::JavaExtractor));
        registry.register(Box::new(rust::RustExtractor));
        registry.register(Box::new(go::GoExtractor));
        registry.register(Box::new(c::CExtractor));
        registry.register(Box::new(c::CppExtractor));
        registry.register(Box::new(ruby::RubyExtractor));
        registry
    }

    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Adds or replaces the extractor for its language.
    pub fn register(&mut self, extractor: Box<dyn LanguageExtractor>) {
        self.extractors.insert(extractor.language(), extractor);
    }

    pub fn get(&self, language: Language) -> Option<&dyn LanguageExtractor> {
        self.extractors.get(&language).map(|e| e.as_ref())
    }

    pub fn languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.extractors.keys().copied().collect();
        languages.sort();
        languages
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::parser::languages::{GrammarAdapter, GRAMMARS};

    #[test]
    fn test_registry_covers_grammars() {
        let registry = ExtractorRegistry::new();
        assert_eq!(
            registry.languages(),
            crate::parser::languages::GRAMMARS.supported_languages()
        );
        assert!(registry.get(Language::Unknown).is_none());
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let depth = 200;
        let mut source = String::from("fn outer() {\n");
        for level in 1..=depth {
            source.push_str(&"    ".repeat(level));
            source.push_str("{\n");
        }
        source.push_str(&"    ".repeat(depth + 1));
        source.push_str("let value = 1;\n");
        for level in (1..=depth).rev() {
            source.push_str(&"    ".repeat(level));
            source.push_str("}\n");
        }
        source.push_str("}\n");

        let tree = GRAMMARS.parse(Language::Rust, &source).unwrap();
        assert!(!tree.root_node().has_error());

        let chunks = extract(Language::Rust, &source);
        assert_eq!(labels(&chunks), vec!["function:outer"]);
        assert_eq!(chunks[0].end_line, 2 * depth + 2);
    }

    #[test]
    fn test_disabled_kinds_are_skipped() {
        let source = "import os\n\nclass A:\n    def m(self):\n        pass\n\ndef f():\n    pass\n";
        let config = ChunkerConfig {
            chunk_by_classes: false,
            chunk_by_methods: false,
            include_imports: false,
            ..ChunkerConfig::default()
        };
        let chunks = extract_with(Language::Python, source, &config);
        assert_eq!(labels(&chunks), vec!["function:f"]);
    }

    #[test]
    fn test_methods_keep_context_without_class_chunks() {
        let source = "class A:\n    def m(self):\n        pass\n";
        let config = ChunkerConfig {
            chunk_by_classes: false,
            ..ChunkerConfig::default()
        };
        let chunks = extract_with(Language::Python, source, &config);
        assert_eq!(labels(&chunks), vec!["method:m"]);
        assert_eq!(chunks[0].parent_context.as_deref(), Some("A"));
    }
}

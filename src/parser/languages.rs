// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language detection and tree-sitter grammar registry

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::{Parser, Tree};

use crate::errors::{Error, Result};

/// Languages known to the chunker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Rust,
    Go,
    C,
    Cpp,
    Ruby,
    Unknown,
}

impl Language {
    /// Identifier used in chunk ids and stored metadata.
    pub fn id(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Ruby => "ruby",
            Language::Unknown => "unknown",
        }
    }

    /// Parses an identifier, falling back to `Unknown`.
    pub fn from_id(id: &str) -> Self {
        match id.to_lowercase().as_str() {
            "python" | "py" => Language::Python,
            "javascript" | "js" => Language::JavaScript,
            "typescript" | "ts" => Language::TypeScript,
            "java" => Language::Java,
            "rust" | "rs" => Language::Rust,
            "go" => Language::Go,
            "c" => Language::C,
            "cpp" | "c++" => Language::Cpp,
            "ruby" | "rb" => Language::Ruby,
            _ => Language::Unknown,
        }
    }

    /// Detects a language from a file extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "py" | "pyi" => Language::Python,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
            "java" => Language::Java,
            "rs" => Language::Rust,
            "go" => Language::Go,
            "c" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "h" => Language::Cpp,
            "rb" => Language::Ruby,
            _ => Language::Unknown,
        }
    }

    /// Detects a language from a path's extension.
    pub fn detect(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Per-language capability that turns source text into a syntax tree.
pub trait GrammarAdapter: Send + Sync {
    fn supports(&self, language: Language) -> bool;

    /// Parses `source`. A tree containing syntax errors is a failure; the
    /// caller is expected to fall back to windowed chunking for the file.
    fn parse(&self, language: Language, source: &str) -> Result<Tree>;
}

/// Tree-sitter grammars for the supported languages
pub struct GrammarRegistry {
    grammars: HashMap<Language, tree_sitter::Language>,
    tsx: tree_sitter::Language,
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarRegistry {
    pub fn new() -> Self {
        let mut grammars = HashMap::new();

        grammars.insert(Language::Python, tree_sitter_python::LANGUAGE.into());
        grammars.insert(Language::JavaScript, tree_sitter_javascript::LANGUAGE.into());
        grammars.insert(
            Language::TypeScript,
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        );
        grammars.insert(Language::Java, tree_sitter_java::LANGUAGE.into());
        grammars.insert(Language::Rust, tree_sitter_rust::LANGUAGE.into());
        grammars.insert(Language::Go, tree_sitter_go::LANGUAGE.into());
        grammars.insert(Language::C, tree_sitter_c::LANGUAGE.into());
        grammars.insert(Language::Cpp, tree_sitter_cpp::LANGUAGE.into());
        grammars.insert(Language::Ruby, tree_sitter_ruby::LANGUAGE.into());

        Self {
            grammars,
            tsx: tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    /// Get grammar by language
    pub fn get(&self, language: Language) -> Option<&tree_sitter::Language> {
        self.grammars.get(&language)
    }

    /// Parses TypeScript sources containing JSX.
    pub fn parse_tsx(&self, source: &str) -> Result<Tree> {
        parse_with(&self.tsx, "tsx", source)
    }

    /// List all supported languages
    pub fn supported_languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.grammars.keys().copied().collect();
        languages.sort();
        languages
    }
}

impl GrammarAdapter for GrammarRegistry {
    fn supports(&self, language: Language) -> bool {
        self.grammars.contains_key(&language)
    }

    fn parse(&self, language: Language, source: &str) -> Result<Tree> {
        let grammar = self
            .get(language)
            .ok_or_else(|| Error::UnsupportedLanguage(language.id().to_string()))?;
        parse_with(grammar, language.id(), source)
    }
}

fn parse_with(grammar: &tree_sitter::Language, label: &str, source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser.set_language(grammar).map_err(|e| Error::Parse {
        path: label.to_string(),
        reason: format!("set_language failed: {}", e),
    })?;

    let tree = parser.parse(source, None).ok_or_else(|| Error::Parse {
        path: label.to_string(),
        reason: "parser returned no tree".to_string(),
    })?;

    if tree.root_node().has_error() {
        return Err(Error::Parse {
            path: label.to_string(),
            reason: "syntax errors in source".to_string(),
        });
    }

    Ok(tree)
}

/// Global grammar registry
pub static GRAMMARS: Lazy<GrammarRegistry> = Lazy::new(GrammarRegistry::new);

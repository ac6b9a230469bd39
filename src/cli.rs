// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// codelens - AST-aware code chunking and semantic retrieval
///
/// Splits source files into functions, methods, classes and imports with
/// tree-sitter, stores them with embeddings, and answers similarity queries.
#[derive(Parser, Debug)]
#[command(name = "codelens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project root (defaults to the nearest indexed ancestor of the current directory)
    #[arg(short, long, global = true)]
    pub path: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Compact JSON output (no pretty formatting)
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Chunk kinds accepted by filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliChunkType {
    Function,
    Method,
    Class,
    Import,
    TextBlock,
}

impl From<CliChunkType> for codelens::ChunkType {
    fn from(value: CliChunkType) -> Self {
        match value {
            CliChunkType::Function => Self::Function,
            CliChunkType::Method => Self::Method,
            CliChunkType::Class => Self::Class,
            CliChunkType::Import => Self::Import,
            CliChunkType::TextBlock => Self::TextBlock,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk and embed every supported file under the project root
    #[command(alias = "i")]
    Index {
        /// Empty the collection before indexing
        #[arg(long)]
        reset: bool,

        /// Chunks per embedding/store batch (overrides config)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Re-index only these files, replacing their stored chunks
        #[arg(long = "file", value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Additional directory names to skip
        #[arg(long = "exclude", value_name = "DIR")]
        exclude_dirs: Vec<String>,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Search indexed chunks by similarity
    #[command(alias = "s")]
    Search {
        /// Natural-language or code query
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Minimum similarity (0.0 - 1.0)
        #[arg(long)]
        threshold: Option<f32>,

        /// Restrict to one language (e.g. python, rust)
        #[arg(short, long)]
        language: Option<String>,

        /// Restrict to one chunk type
        #[arg(short = 't', long = "type", value_enum)]
        chunk_type: Option<CliChunkType>,

        /// Restrict to one file (path relative to the project root)
        #[arg(short, long)]
        file: Option<String>,

        /// Print the chunk content under each result
        #[arg(short, long)]
        content: bool,
    },

    /// Find chunks similar to a code snippet read from a file
    Similar {
        /// File containing the snippet
        snippet: PathBuf,

        /// Maximum number of results
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Restrict to one language
        #[arg(short, long)]
        language: Option<String>,

        /// Print the chunk content under each result
        #[arg(short, long)]
        content: bool,
    },

    /// Show collection statistics
    Stats,

    /// Print a stored chunk by id
    Get {
        /// Chunk id (e.g. python_function_1a2b3c4d5e6f)
        id: String,
    },

    /// Delete chunks by id or metadata
    Delete {
        /// Chunk ids to delete
        #[arg(long = "id", value_name = "ID")]
        ids: Vec<String>,

        /// Delete chunks of this file
        #[arg(short, long)]
        file: Option<String>,

        /// Delete chunks of this language
        #[arg(short, long)]
        language: Option<String>,

        /// Delete chunks of this type
        #[arg(short = 't', long = "type", value_enum)]
        chunk_type: Option<CliChunkType>,
    },

    /// Remove every chunk from the collection
    Reset,

    /// Write all chunks to a JSON file
    Export {
        /// Output file
        output: PathBuf,
    },

    /// Load chunks from a JSON export, re-embedding their content
    Import {
        /// Input file
        input: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

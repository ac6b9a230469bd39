// SPDX-License-Identifier: MIT OR Apache-2.0

//! `codelens search` and `codelens similar`

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::{CliChunkType, OutputFormat};
use crate::commands::{parse_language, Project};
use codelens::output::{
    colorize_dim, colorize_kind, colorize_line_range, colorize_name, colorize_path, indent,
    print_json, use_colors,
};
use codelens::{ChunkType, MetadataFilter, RetrievalEngine, RetrievedChunk};

/// Filters accepted by `search`.
#[derive(Debug, Default)]
pub struct SearchFilters<'a> {
    pub language: Option<&'a str>,
    pub chunk_type: Option<CliChunkType>,
    pub file: Option<&'a str>,
}

impl SearchFilters<'_> {
    fn to_filter(&self) -> Result<Option<MetadataFilter>> {
        let mut filter = MetadataFilter::new();
        if let Some(language) = self.language {
            filter = filter.and(MetadataFilter::by_language(parse_language(language)?));
        }
        if let Some(chunk_type) = self.chunk_type {
            filter = filter.and(MetadataFilter::by_chunk_type(ChunkType::from(chunk_type)));
        }
        if let Some(file) = self.file {
            filter = filter.and(MetadataFilter::by_file(file));
        }
        Ok((!filter.is_empty()).then_some(filter))
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    project: &Project,
    query: &str,
    top_k: Option<usize>,
    threshold: Option<f32>,
    filters: SearchFilters<'_>,
    show_content: bool,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let filter = filters.to_filter()?;
    let mut engine = engine(project)?;
    let results = engine.search_with_filter(query, top_k, filter.as_ref(), threshold)?;
    render(&results, show_content, format, compact)
}

pub fn run_similar(
    project: &Project,
    snippet: &Path,
    top_k: Option<usize>,
    language: Option<&str>,
    show_content: bool,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let code = std::fs::read_to_string(snippet)
        .with_context(|| format!("failed to read {}", snippet.display()))?;
    let language = language.map(parse_language).transpose()?;
    let mut engine = engine(project)?;
    let results = engine.find_similar_code(&code, top_k, language)?;
    render(&results, show_content, format, compact)
}

fn engine(project: &Project) -> Result<RetrievalEngine> {
    let index = project.open_existing_index()?;
    Ok(RetrievalEngine::new(index, project.config.retrieval_config()?))
}

fn render(
    results: &[RetrievedChunk],
    show_content: bool,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(results, compact)?,
        OutputFormat::Text => {
            if results.is_empty() {
                println!("No results found");
                return Ok(());
            }
            let color = use_colors();
            for result in results {
                println!("{}", headline(result, color));
                if show_content {
                    println!("{}\n", indent(&result.content, 4));
                }
            }
        }
    }
    Ok(())
}

/// `rank. path:lines  type  Parent.name  (similarity)  id`
fn headline(result: &RetrievedChunk, color: bool) -> String {
    let location = match (result.start_line(), result.end_line()) {
        (Some(start), Some(end)) => format!(
            "{}:{}",
            colorize_path(result.file_path().unwrap_or("?"), color),
            colorize_line_range(start + 1, end + 1, color)
        ),
        _ => colorize_path(result.file_path().unwrap_or("?"), color),
    };
    let name = match (result.parent_context(), result.name()) {
        (Some(parent), Some(name)) => format!("{}.{}", parent, name),
        (None, Some(name)) => name.to_string(),
        _ => String::new(),
    };
    format!(
        "{:>2}. {}  {}  {}  {}  {}",
        result.rank,
        location,
        colorize_kind(result.chunk_type().unwrap_or("?"), color),
        colorize_name(&name, color),
        colorize_dim(&format!("({:.3})", result.similarity), color),
        colorize_dim(&result.chunk_id, color),
    )
}

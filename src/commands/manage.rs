// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collection maintenance: `stats`, `get`, `delete`, `reset`, `export`, `import`.

use anyhow::{bail, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use crate::cli::{CliChunkType, OutputFormat};
use crate::commands::{parse_language, Project};
use codelens::output::{colorize_kind, colorize_path, print_json, use_colors};
use codelens::{ChunkType, MetadataFilter};

pub fn stats(project: &Project, format: OutputFormat, compact: bool) -> Result<()> {
    let index = project.open_existing_index()?;
    let stats = index.statistics()?;

    match format {
        OutputFormat::Json => print_json(&stats, compact)?,
        OutputFormat::Text => {
            let color = use_colors();
            println!("Collection:  {}", colorize_path(&stats.collection_name, color));
            println!("Chunks:      {}", stats.total_chunks);
            println!("Model:       {}", stats.embedding_model);
            println!("Metric:      {}", stats.distance_metric);
            if !stats.chunk_types.is_empty() {
                println!("\nChunk types (sampled):");
                for (chunk_type, count) in &stats.chunk_types {
                    println!("  {:<12} {}", colorize_kind(chunk_type, color), count);
                }
            }
            if !stats.languages.is_empty() {
                println!("\nLanguages (sampled):");
                for (language, count) in &stats.languages {
                    println!("  {:<12} {}", language, count);
                }
            }
        }
    }
    Ok(())
}

pub fn get(project: &Project, id: &str, format: OutputFormat, compact: bool) -> Result<()> {
    let index = project.open_existing_index()?;
    let Some(chunk) = index.get_by_id(id)? else {
        bail!("no chunk with id '{}'", id);
    };

    match format {
        OutputFormat::Json => print_json(&chunk.to_record(), compact)?,
        OutputFormat::Text => {
            let color = use_colors();
            println!(
                "{}:{}-{}  {}  {}",
                colorize_path(&chunk.file_path, color),
                chunk.start_line + 1,
                chunk.end_line + 1,
                colorize_kind(chunk.chunk_type.as_str(), color),
                chunk.name.as_deref().unwrap_or("")
            );
            if let Some(parent) = &chunk.parent_context {
                println!("parent: {}", parent);
            }
            println!("\n{}", chunk.content);
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct DeleteResult {
    deleted: usize,
}

pub fn delete(
    project: &Project,
    ids: &[String],
    file: Option<&str>,
    language: Option<&str>,
    chunk_type: Option<CliChunkType>,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let mut filter = MetadataFilter::new();
    if let Some(file) = file {
        filter = filter.and(MetadataFilter::by_file(file));
    }
    if let Some(language) = language {
        filter = filter.and(MetadataFilter::by_language(parse_language(language)?));
    }
    if let Some(chunk_type) = chunk_type {
        filter = filter.and(MetadataFilter::by_chunk_type(ChunkType::from(chunk_type)));
    }
    if ids.is_empty() && filter.is_empty() {
        bail!("nothing to delete: pass --id, --file, --language or --type");
    }

    let mut index = project.open_existing_index()?;
    let mut deleted = 0;
    if !ids.is_empty() {
        deleted += index.delete_ids(ids)?;
    }
    if !filter.is_empty() {
        deleted += index.delete_by_filter(&filter)?;
    }

    match format {
        OutputFormat::Json => print_json(&DeleteResult { deleted }, compact)?,
        OutputFormat::Text => println!("{} Deleted {} chunks", "✓".green(), deleted),
    }
    Ok(())
}

pub fn reset(project: &Project) -> Result<()> {
    let mut index = project.open_existing_index()?;
    let before = index.count()?;
    index.reset()?;
    println!(
        "{} Removed {} chunks from {}",
        "✓".green(),
        before,
        index.collection_name()
    );
    Ok(())
}

pub fn export(project: &Project, output: &Path) -> Result<()> {
    let index = project.open_existing_index()?;
    let count = index.export_chunks(output)?;
    println!("{} Exported {} chunks to {}", "✓".green(), count, output.display());
    Ok(())
}

pub fn import(project: &Project, input: &Path) -> Result<()> {
    let mut index = project.open_index()?;
    let count = index.import_chunks(input)?;
    println!("{} Imported {} chunks from {}", "✓".green(), count, input.display());
    Ok(())
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! `codelens index`

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::commands::Project;
use codelens::errors::Error;
use codelens::indexer::{IndexObserver, IndexPipeline, IndexingStats};
use codelens::output::{colorize_dim, print_json, use_colors};

/// Drives an indicatif progress bar from pipeline events.
struct ProgressObserver {
    pb: ProgressBar,
}

impl ProgressObserver {
    fn new(quiet: bool) -> Result<Self> {
        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{bar:40.cyan/blue}] {pos}/{len} files | Indexing {msg}")?
                    .progress_chars("##."),
            );
            pb
        };
        Ok(Self { pb })
    }

    fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl IndexObserver for ProgressObserver {
    fn on_start(&self, total_files: usize) {
        self.pb.set_length(total_files as u64);
    }

    fn on_file_processed(&self, path: &str, _chunks: usize) {
        self.pb.set_message(path.to_string());
        self.pb.inc(1);
    }

    fn on_error(&self, path: &str, error: &Error) {
        self.pb
            .suspend(|| eprintln!("{} {}: {}", "Warning:".yellow(), path, error));
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    project: &Project,
    reset: bool,
    batch_size: Option<usize>,
    files: &[PathBuf],
    exclude_dirs: &[String],
    quiet: bool,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let mut index = project.open_index()?;
    if reset {
        index.reset()?;
    }

    let mut all_excludes = exclude_dirs.to_vec();
    all_excludes.extend(project.config.index().exclude_dirs().iter().cloned());

    let mut pipeline = IndexPipeline::from_config(&project.config)?.with_exclude_dirs(&all_excludes);
    if let Some(size) = batch_size {
        pipeline = pipeline.with_batch_size(size);
    }

    let observer = ProgressObserver::new(quiet || format == OutputFormat::Json)?;
    let result = if files.is_empty() {
        pipeline.index_directory(&project.root, &mut index, &observer)
    } else {
        let mut total = IndexingStats::default();
        let mut outcome = Ok(());
        for file in files {
            match pipeline.reindex_file(&project.root, file, &mut index, &observer) {
                Ok(stats) => total.merge(&stats),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        outcome.map(|_| total)
    };
    observer.finish();
    let stats = result?;

    match format {
        OutputFormat::Json => print_json(&stats, compact)?,
        OutputFormat::Text => print_summary(&stats, index.count()?),
    }
    Ok(())
}

fn print_summary(stats: &IndexingStats, total_chunks: usize) {
    let color = use_colors();
    let check = if color { "✓".green().to_string() } else { "✓".to_string() };
    println!(
        "{} Indexed {} files into {} chunks ({} total in collection)",
        check, stats.files_processed, stats.chunks_added, total_chunks
    );
    let details = [
        (stats.files_fallback, "files chunked as text blocks"),
        (stats.chunks_rejected, "chunks outside size bounds"),
        (stats.files_skipped, "large or binary files skipped"),
    ];
    for (count, label) in details {
        if count > 0 {
            println!("  {} {}", colorize_dim(&count.to_string(), color), label);
        }
    }
    if stats.errors > 0 {
        eprintln!("Warning: {} files had errors", stats.errors);
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! codelens - AST-aware code chunking and semantic retrieval
//!
//! Indexes a codebase into function, method, class and import chunks and
//! answers similarity queries over them.

mod cli;
mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands};
use commands::Project;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize tracing with CODELENS_LOG env var (e.g., CODELENS_LOG=debug codelens index)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CODELENS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;
    let compact = cli.compact;

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "codelens", &mut std::io::stdout());
        return Ok(());
    }

    let project = Project::discover(cli.path.as_deref())?;

    match cli.command {
        Commands::Index {
            reset,
            batch_size,
            files,
            exclude_dirs,
            quiet,
        } => {
            commands::index::run(
                &project,
                reset,
                batch_size,
                &files,
                &exclude_dirs,
                quiet,
                format,
                compact,
            )?;
        }
        Commands::Search {
            query,
            top_k,
            threshold,
            language,
            chunk_type,
            file,
            content,
        } => {
            let filters = commands::search::SearchFilters {
                language: language.as_deref(),
                chunk_type,
                file: file.as_deref(),
            };
            commands::search::run(
                &project, &query, top_k, threshold, filters, content, format, compact,
            )?;
        }
        Commands::Similar {
            snippet,
            top_k,
            language,
            content,
        } => {
            commands::search::run_similar(
                &project,
                &snippet,
                top_k,
                language.as_deref(),
                content,
                format,
                compact,
            )?;
        }
        Commands::Stats => commands::manage::stats(&project, format, compact)?,
        Commands::Get { id } => commands::manage::get(&project, &id, format, compact)?,
        Commands::Delete {
            ids,
            file,
            language,
            chunk_type,
        } => {
            commands::manage::delete(
                &project,
                &ids,
                file.as_deref(),
                language.as_deref(),
                chunk_type,
                format,
                compact,
            )?;
        }
        Commands::Reset => commands::manage::reset(&project)?,
        Commands::Export { output } => commands::manage::export(&project, &output)?,
        Commands::Import { input } => commands::manage::import(&project, &input)?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}

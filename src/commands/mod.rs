// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.

pub mod index;
pub mod manage;
pub mod search;

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use codelens::config::Config;
use codelens::embedding::provider_from_config;
use codelens::errors::IndexNotFoundError;
use codelens::store::IndexStore;
use codelens::utils::get_root_with_index;
use codelens::Language;

/// Resolved project root and its configuration.
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
}

impl Project {
    /// Uses `path` when given, else the nearest indexed ancestor of the
    /// current directory.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        let root = match path {
            Some(path) => path.to_path_buf(),
            None => get_root_with_index(std::env::current_dir()?),
        };
        if !root.is_dir() {
            bail!("{} is not a directory", root.display());
        }
        let config = Config::load_in(&root);
        Ok(Self { root, config })
    }

    /// Opens the chunk index, creating it if needed.
    pub fn open_index(&self) -> Result<IndexStore> {
        let store_config = self.config.store_config(&self.root)?;
        let embedder = provider_from_config(self.config.embeddings())
            .context("failed to initialize embedding provider")?;
        let size_filter = self.config.chunker_config()?.size_filter();
        let index = IndexStore::open(&store_config, embedder).with_context(|| {
            format!(
                "failed to open chunk store at {}",
                store_config.database_path().display()
            )
        })?;
        Ok(index.with_size_filter(size_filter))
    }

    /// Opens the chunk index, failing if nothing has been indexed yet.
    pub fn open_existing_index(&self) -> Result<IndexStore> {
        let store_config = self.config.store_config(&self.root)?;
        let database = store_config.database_path();
        if !database.exists() {
            return Err(IndexNotFoundError {
                path: self.root.display().to_string(),
            }
            .into());
        }
        self.open_index()
    }
}

/// Parses a language name, rejecting unknown names.
pub fn parse_language(name: &str) -> Result<Language> {
    match Language::from_id(name) {
        Language::Unknown if !name.eq_ignore_ascii_case("unknown") => {
            bail!("unknown language '{}'", name)
        }
        language => Ok(language),
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! File scanner using the ignore crate (same as ripgrep)

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use crate::utils::INDEX_DIR;

/// Extensions indexed when none are configured: every language with a grammar.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "py", "pyi", "js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts", "java", "rs", "go", "c",
    "h", "cpp", "cc", "cxx", "hpp", "hh", "rb",
];

/// Directory names never descended into.
const ALWAYS_EXCLUDED: &[&str] = &[".git", INDEX_DIR];

/// File scanner that respects .gitignore
pub struct FileScanner {
    root: PathBuf,
    extensions: Vec<String>,
    exclude_dirs: Vec<String>,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            exclude_dirs: ALWAYS_EXCLUDED.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Replaces the extension list; an empty list keeps the defaults.
    pub fn with_extensions(mut self, extensions: &[String]) -> Self {
        if !extensions.is_empty() {
            self.extensions = extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect();
        }
        self
    }

    /// Adds directory names to skip.
    pub fn with_exclude_dirs(mut self, dirs: &[String]) -> Self {
        self.exclude_dirs.extend(dirs.iter().cloned());
        self
    }

    /// Paths of all matching files, sorted.
    pub fn list_files(&self) -> Vec<PathBuf> {
        let (tx, rx) = mpsc::channel();

        let exclude_dirs = self.exclude_dirs.clone();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_exclude(true)
            .require_git(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !is_dir
                    || entry
                        .file_name()
                        .to_str()
                        .map(|name| !exclude_dirs.iter().any(|d| d == name))
                        .unwrap_or(true)
            })
            .build_parallel();

        let extensions = self.extensions.clone();

        walker.run(|| {
            let tx = tx.clone();
            let extensions = extensions.clone();

            Box::new(move |entry| {
                if let Ok(entry) = entry {
                    let path = entry.path();
                    if path.is_file() {
                        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                            if extensions.contains(&ext.to_lowercase()) {
                                let _ = tx.send(path.to_path_buf());
                            }
                        }
                    }
                }
                ignore::WalkState::Continue
            })
        });

        drop(tx);
        let mut files: Vec<PathBuf> = rx.into_iter().collect();
        files.sort();
        files
    }
}

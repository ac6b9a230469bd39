// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locating the index directory of a project.

use std::path::{Path, PathBuf};

/// Directory holding the chunk database, relative to the project root
pub const INDEX_DIR: &str = ".codelens";

/// A project root that already has an index directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRoot {
    /// Directory containing `.codelens`
    pub root: PathBuf,
    pub index_path: PathBuf,
    /// Found in an ancestor of the start directory
    pub is_parent: bool,
}

/// Walks up from `start` to the nearest directory containing `.codelens`.
pub fn find_index_root(start: impl AsRef<Path>) -> Option<IndexRoot> {
    let start = start.as_ref();
    let original = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());

    original.ancestors().find_map(|dir| {
        let index_path = dir.join(INDEX_DIR);
        index_path.is_dir().then(|| IndexRoot {
            root: dir.to_path_buf(),
            index_path,
            is_parent: dir != original,
        })
    })
}

/// Project root for `start`: the nearest indexed ancestor, else `start`.
pub fn get_root_with_index(start: impl AsRef<Path>) -> PathBuf {
    match find_index_root(&start) {
        Some(found) => found.root,
        None => start.as_ref().to_path_buf(),
    }
}

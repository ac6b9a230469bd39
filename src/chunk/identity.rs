// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content-addressed chunk identifiers.
//!
//! Ids take the form `{language}_{chunk_type}_{hash}` where `hash` is the first
//! [`HASH_LEN`] hex characters of the blake3 digest of
//! `"{file_path}:{start_line}:{content}"`. The same inputs always produce the
//! same id, so re-indexing an unchanged file upserts onto the same records.
//!
//! The start line is part of the digest: inserting a line above an unchanged
//! function gives that function a new id.

use crate::chunk::ChunkType;
use crate::parser::languages::Language;

/// Number of hex characters kept from the digest.
pub const HASH_LEN: usize = 12;

/// Derives stable chunk identifiers.
pub struct ChunkIdentity;

impl ChunkIdentity {
    pub fn compute(
        language: Language,
        chunk_type: ChunkType,
        file_path: &str,
        start_line: usize,
        content: &str,
    ) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(file_path.as_bytes());
        hasher.update(b":");
        hasher.update(start_line.to_string().as_bytes());
        hasher.update(b":");
        hasher.update(content.as_bytes());
        let digest = hasher.finalize().to_hex();

        format!("{}_{}_{}", language.id(), chunk_type, &digest[..HASH_LEN])
    }
}

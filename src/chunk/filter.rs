// SPDX-License-Identifier: MIT OR Apache-2.0

//! Size bounds applied to extracted chunks.

use crate::chunk::CodeChunk;

/// Admits chunks whose content length (in characters) lies in `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeFilter {
    min_chunk_size: usize,
    max_chunk_size: usize,
}

impl SizeFilter {
    pub fn new(min_chunk_size: usize, max_chunk_size: usize) -> Self {
        Self {
            min_chunk_size,
            max_chunk_size,
        }
    }

    pub fn accepts(&self, chunk: &CodeChunk) -> bool {
        let len = chunk.char_len();
        self.min_chunk_size <= len && len <= self.max_chunk_size
    }

    /// Keeps admitted chunks in order and returns how many were dropped.
    pub fn retain(&self, chunks: &mut Vec<CodeChunk>) -> usize {
        let before = chunks.len();
        chunks.retain(|chunk| self.accepts(chunk));
        before - chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkType;
    use crate::parser::languages::Language;

    fn chunk_of(len: usize) -> CodeChunk {
        CodeChunk::new(
            "x".repeat(len),
            ChunkType::TextBlock,
            Language::Unknown,
            "f.txt",
            0,
            0,
        )
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let filter = SizeFilter::new(5, 10);
        assert!(!filter.accepts(&chunk_of(4)));
        assert!(filter.accepts(&chunk_of(5)));
        assert!(filter.accepts(&chunk_of(10)));
        assert!(!filter.accepts(&chunk_of(11)));
    }

    #[test]
    fn test_length_counts_characters() {
        let filter = SizeFilter::new(3, 3);
        let chunk = CodeChunk::new(
            "äöü".to_string(),
            ChunkType::TextBlock,
            Language::Unknown,
            "f.txt",
            0,
            0,
        );
        assert!(filter.accepts(&chunk));
    }

    #[test]
    fn test_retain_counts_rejections() {
        let filter = SizeFilter::new(2, 4);
        let mut chunks = vec![chunk_of(1), chunk_of(3), chunk_of(9), chunk_of(4)];
        let rejected = filter.retain(&mut chunks);
        assert_eq!(rejected, 2);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].char_len(), 3);
        assert_eq!(chunks[1].char_len(), 4);
    }
}

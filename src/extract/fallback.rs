// SPDX-License-Identifier: MIT OR Apache-2.0

//! Character windows for files without a usable syntax tree.
//!
//! A window holds at most `max_chunk_size` characters. It ends just after the
//! last newline inside it when that keeps at least half a window, otherwise it
//! is cut at exactly `max_chunk_size` characters. With `overlap_size = 0` the
//! windows are contiguous and concatenate back to the original text.

use crate::chunk::{ChunkType, CodeChunk};
use crate::parser::languages::Language;

#[derive(Debug, Clone, Copy)]
pub struct WindowChunker {
    max_chunk_size: usize,
    overlap_size: usize,
}

impl WindowChunker {
    /// `overlap_size` is expected to be smaller than `max_chunk_size`;
    /// `ChunkerConfig::new` enforces it.
    pub fn new(max_chunk_size: usize, overlap_size: usize) -> Self {
        Self {
            max_chunk_size: max_chunk_size.max(1),
            overlap_size,
        }
    }

    pub fn chunk(&self, source: &str, file_path: &str, language: Language) -> Vec<CodeChunk> {
        if source.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = source.chars().collect();
        // line_of[i] = number of newlines before char i
        let mut line_of = Vec::with_capacity(chars.len() + 1);
        let mut line = 0;
        for c in &chars {
            line_of.push(line);
            if *c == '\n' {
                line += 1;
            }
        }
        line_of.push(line);

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let hard_end = (start + self.max_chunk_size).min(chars.len());
            let end = if hard_end == chars.len() {
                hard_end
            } else {
                self.soft_break(&chars[start..hard_end])
                    .map(|cut| start + cut)
                    .unwrap_or(hard_end)
            };

            let content: String = chars[start..end].iter().collect();
            chunks.push(
                CodeChunk::new(
                    content,
                    ChunkType::TextBlock,
                    language,
                    file_path,
                    line_of[start],
                    line_of[end - 1],
                )
                .with_metadata("fallback", true),
            );

            if end == chars.len() {
                break;
            }
            start = end.saturating_sub(self.overlap_size).max(start + 1);
        }

        chunks
    }

    /// Offset just past the last newline, if that keeps half a window.
    fn soft_break(&self, window: &[char]) -> Option<usize> {
        let cut = window.iter().rposition(|c| *c == '\n')? + 1;
        (cut >= self.max_chunk_size / 2).then_some(cut)
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Span-based text extraction from source lines.
//!
//! Sources are split on `\n` only, so row numbers reported by tree-sitter index
//! directly into the line slice. Tree-sitter columns are byte offsets.

use tree_sitter::Node;

/// Splits source into physical lines, keeping a trailing empty line.
pub fn split_lines(source: &str) -> Vec<&str> {
    source.split('\n').collect()
}

/// Exact text covered by the node's span.
///
/// Single-line spans are column-bounded; multi-line spans join the tail of the
/// start line, every whole line in between and the head of the end line.
pub fn node_text(node: Node<'_>, lines: &[&str]) -> String {
    let start = node.start_position();
    let end = node.end_position();

    if start.row >= lines.len() {
        return String::new();
    }

    if start.row == end.row {
        return slice(lines[start.row], start.column, Some(end.column)).to_string();
    }

    let mut text = slice(lines[start.row], start.column, None).to_string();
    for row in (start.row + 1)..end.row.min(lines.len()) {
        text.push('\n');
        text.push_str(lines[row]);
    }
    if end.row < lines.len() {
        text.push('\n');
        text.push_str(slice(lines[end.row], 0, Some(end.column)));
    }
    text
}

/// Whole physical lines `start_row..=end_row` of the node.
///
/// Includes characters on the boundary lines outside the node's columns,
/// e.g. the indentation before a method.
pub fn node_content(node: Node<'_>, lines: &[&str]) -> String {
    line_range(lines, node.start_position().row, end_row(node))
}

/// Last row holding any of the node's text.
///
/// Nodes that swallow their trailing newline (C `#include`, for one) end at
/// column 0 of the following row; that row is not part of the node.
pub fn end_row(node: Node<'_>) -> usize {
    let start = node.start_position();
    let end = node.end_position();
    if end.column == 0 && end.row > start.row {
        end.row - 1
    } else {
        end.row
    }
}

/// Joins lines `start..=end`, clamped to the available lines.
pub fn line_range(lines: &[&str], start: usize, end: usize) -> String {
    if start >= lines.len() {
        return String::new();
    }
    let end = end.min(lines.len() - 1);
    lines[start..=end].join("\n")
}

fn slice(line: &str, start: usize, end: Option<usize>) -> &str {
    let end = end.unwrap_or(line.len()).min(line.len());
    let start = start.min(end);
    line.get(start..end).unwrap_or("")
}

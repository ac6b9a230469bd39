// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal and JSON output helpers shared by the CLI commands.
//!
//! Colors respect the NO_COLOR environment variable.

use colored::Colorize;
use serde::Serialize;

use crate::errors::Result;

/// Check if colors should be used (respects NO_COLOR env var)
pub fn use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Colorize file path (cyan)
pub fn colorize_path(text: &str, use_color: bool) -> String {
    if use_color {
        text.cyan().to_string()
    } else {
        text.to_string()
    }
}

/// Colorize line numbers (yellow)
pub fn colorize_line_range(start: u64, end: u64, use_color: bool) -> String {
    let text = if start == end {
        start.to_string()
    } else {
        format!("{}-{}", start, end)
    };
    if use_color {
        text.yellow().to_string()
    } else {
        text
    }
}

/// Colorize chunk type (green)
pub fn colorize_kind(text: &str, use_color: bool) -> String {
    if use_color {
        text.green().to_string()
    } else {
        text.to_string()
    }
}

/// Colorize symbol name (bold)
pub fn colorize_name(text: &str, use_color: bool) -> String {
    if use_color {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

/// Colorize secondary details such as scores and ids (dimmed)
pub fn colorize_dim(text: &str, use_color: bool) -> String {
    if use_color {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

/// Serializes `value` as JSON, pretty unless `compact`.
pub fn to_json<T: Serialize + ?Sized>(value: &T, compact: bool) -> Result<String> {
    Ok(if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    })
}

/// Prints `value` as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T, compact: bool) -> Result<()> {
    println!("{}", to_json(value, compact)?);
    Ok(())
}

/// Indents every line of `text` by `width` spaces.
pub fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

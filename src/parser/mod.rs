// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tree-sitter grammars and span helpers.

pub mod languages;
pub mod text;

pub use languages::{GrammarAdapter, GrammarRegistry, Language, GRAMMARS};

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rust chunk extraction.
//!
//! `impl` blocks act as classes named after the implemented type, so every
//! associated function inside them becomes a method of that type.

use tree_sitter::Node;

use super::{field_text, LanguageExtractor, NodeTaxonomy};
use crate::parser::languages::Language;

static TAXONOMY: NodeTaxonomy = NodeTaxonomy {
    class_kinds: &["impl_item", "trait_item", "struct_item", "enum_item"],
    function_kinds: &["function_item"],
    import_kinds: &["use_declaration", "extern_crate_declaration"],
};

pub struct RustExtractor;

impl LanguageExtractor for RustExtractor {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn taxonomy(&self) -> &'static NodeTaxonomy {
        &TAXONOMY
    }

    fn symbol_name(&self, node: Node<'_>, lines: &[&str]) -> Option<String> {
        if node.kind() == "impl_item" {
            return field_text(node, "type", lines);
        }
        field_text(node, "name", lines)
    }
}

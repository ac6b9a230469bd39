// SPDX-License-Identifier: MIT OR Apache-2.0

//! Go chunk extraction.
//!
//! Go has no class bodies; a `method_declaration` is attached to the type
//! named by its receiver instead.

use tree_sitter::Node;

use super::{LanguageExtractor, NodeTaxonomy};
use crate::parser::languages::Language;
use crate::parser::text::node_text;

static TAXONOMY: NodeTaxonomy = NodeTaxonomy {
    class_kinds: &[],
    function_kinds: &["function_declaration", "method_declaration"],
    import_kinds: &["import_declaration"],
};

pub struct GoExtractor;

impl LanguageExtractor for GoExtractor {
    fn language(&self) -> Language {
        Language::Go
    }

    fn taxonomy(&self) -> &'static NodeTaxonomy {
        &TAXONOMY
    }

    /// Receiver type name, pointer and type arguments stripped.
    fn receiver(&self, node: Node<'_>, lines: &[&str]) -> Option<String> {
        if node.kind() != "method_declaration" {
            return None;
        }
        let receiver = node.child_by_field_name("receiver")?;
        let param = receiver.named_child(0)?;
        let ty = param.child_by_field_name("type")?;
        let text = node_text(ty, lines);
        let name = text
            .trim_start_matches('*')
            .split('[')
            .next()
            .unwrap_or_default()
            .trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }
}

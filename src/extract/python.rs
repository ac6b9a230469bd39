// SPDX-License-Identifier: MIT OR Apache-2.0

//! Python chunk extraction.

use tree_sitter::Node;

use super::{LanguageExtractor, NodeTaxonomy};
use crate::parser::languages::Language;
use crate::parser::text::node_text;

static TAXONOMY: NodeTaxonomy = NodeTaxonomy {
    class_kinds: &["class_definition"],
    function_kinds: &["function_definition"],
    import_kinds: &[
        "import_statement",
        "import_from_statement",
        "future_import_statement",
    ],
};

pub struct PythonExtractor;

impl LanguageExtractor for PythonExtractor {
    fn language(&self) -> Language {
        Language::Python
    }

    fn taxonomy(&self) -> &'static NodeTaxonomy {
        &TAXONOMY
    }

    /// A string literal as the first statement of the body, quotes stripped.
    fn docstring(&self, node: Node<'_>, lines: &[&str]) -> Option<String> {
        let body = node.child_by_field_name("body")?;
        let first = body.named_child(0)?;
        if first.kind() != "expression_statement" {
            return None;
        }
        let literal = first.named_child(0)?;
        if literal.kind() != "string" {
            return None;
        }
        let text = node_text(literal, lines);
        let doc = text.trim_matches(|c| c == '"' || c == '\'');
        if doc.is_empty() {
            None
        } else {
            Some(doc.to_string())
        }
    }
}

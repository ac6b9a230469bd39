// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ruby chunk extraction.
//!
//! Ruby has no import statement; top-level `require`, `require_relative` and
//! `load` calls are treated as imports.

use tree_sitter::Node;

use super::{field_text, LanguageExtractor, NodeTaxonomy};
use crate::parser::languages::Language;

static TAXONOMY: NodeTaxonomy = NodeTaxonomy {
    class_kinds: &["class", "module"],
    function_kinds: &["method", "singleton_method"],
    import_kinds: &[],
};

const REQUIRE_METHODS: &[&str] = &["require", "require_relative", "load"];

pub struct RubyExtractor;

impl LanguageExtractor for RubyExtractor {
    fn language(&self) -> Language {
        Language::Ruby
    }

    fn taxonomy(&self) -> &'static NodeTaxonomy {
        &TAXONOMY
    }

    fn is_import(&self, node: Node<'_>, lines: &[&str]) -> bool {
        if node.kind() != "call" || node.child_by_field_name("receiver").is_some() {
            return false;
        }
        field_text(node, "method", lines)
            .map(|method| REQUIRE_METHODS.contains(&method.as_str()))
            .unwrap_or(false)
    }
}

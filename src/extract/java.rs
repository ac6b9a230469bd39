// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{LanguageExtractor, NodeTaxonomy};
use crate::parser::languages::Language;

static TAXONOMY: NodeTaxonomy = NodeTaxonomy {
    class_kinds: &[
        "class_declaration",
        "interface_declaration",
        "enum_declaration",
        "record_declaration",
    ],
    function_kinds: &["method_declaration", "constructor_declaration"],
    import_kinds: &["import_declaration"],
};

pub struct JavaExtractor;

impl LanguageExtractor for JavaExtractor {
    fn language(&self) -> Language {
        Language::Java
    }

    fn taxonomy(&self) -> &'static NodeTaxonomy {
        &TAXONOMY
    }
}

#[cfg(test)]
mod tests {
    use crate::extract::test_support::{extract, labels};
    use crate::parser::languages::Language;

    #[test]
    fn test_java_classes_and_inner_types() {
        let source = r#"package demo;

import java.util.List;
import java.util.Map;

public class Registry {
    private final Map<String, Integer> counts;

    public Registry(Map<String, Integer> counts) {
        this.counts = counts;
    }

    public int lookup(String key) {
        return counts.getOrDefault(key, 0);
    }

    enum Mode {
        FAST,
        SLOW;

        boolean isFast() {
            return this == FAST;
        }
    }
}
"#;
        let chunks = extract(Language::Java, source);
        assert_eq!(
            labels(&chunks),
            vec![
                "import",
                "import",
                "class:Registry",
                "method:Registry",
                "method:lookup",
                "class:Mode",
                "method:isFast",
            ]
        );
        let is_fast = chunks.iter().find(|c| c.label() == "method:isFast").unwrap();
        assert_eq!(is_fast.parent_context.as_deref(), Some("Mode"));
        let lookup = chunks.iter().find(|c| c.label() == "method:lookup").unwrap();
        assert_eq!(lookup.parent_context.as_deref(), Some("Registry"));
    }
}

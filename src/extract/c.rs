// SPDX-License-Identifier: MIT OR Apache-2.0

//! C and C++ chunk extraction.
//!
//! Function names are not a direct field of `function_definition`; they sit at
//! the bottom of the `declarator` chain (pointer, reference and function
//! declarators wrap the identifier).

use tree_sitter::Node;

use super::{field_text, LanguageExtractor, NodeTaxonomy};
use crate::parser::languages::Language;
use crate::parser::text::node_text;

static C_TAXONOMY: NodeTaxonomy = NodeTaxonomy {
    class_kinds: &[],
    function_kinds: &["function_definition"],
    import_kinds: &["preproc_include"],
};

static CPP_TAXONOMY: NodeTaxonomy = NodeTaxonomy {
    class_kinds: &["class_specifier", "struct_specifier"],
    function_kinds: &["function_definition"],
    import_kinds: &["preproc_include", "using_declaration"],
};

/// Innermost declarator of a function definition.
fn innermost_declarator(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node.child_by_field_name("declarator")?;
    loop {
        let next = match current.kind() {
            "reference_declarator" => current.named_child(0),
            _ => current.child_by_field_name("declarator"),
        };
        match next {
            Some(inner) => current = inner,
            None => return Some(current),
        }
    }
}

fn function_name(node: Node<'_>, lines: &[&str]) -> Option<String> {
    let declarator = innermost_declarator(node)?;
    if declarator.kind() == "qualified_identifier" {
        return field_text(declarator, "name", lines);
    }
    let text = node_text(declarator, lines);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub struct CExtractor;

impl LanguageExtractor for CExtractor {
    fn language(&self) -> Language {
        Language::C
    }

    fn taxonomy(&self) -> &'static NodeTaxonomy {
        &C_TAXONOMY
    }

    fn symbol_name(&self, node: Node<'_>, lines: &[&str]) -> Option<String> {
        function_name(node, lines)
    }
}

pub struct CppExtractor;

impl LanguageExtractor for CppExtractor {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn taxonomy(&self) -> &'static NodeTaxonomy {
        &CPP_TAXONOMY
    }

    fn symbol_name(&self, node: Node<'_>, lines: &[&str]) -> Option<String> {
        if node.kind() == "function_definition" {
            function_name(node, lines)
        } else {
            field_text(node, "name", lines)
        }
    }

    /// Out-of-line member definitions (`void Foo::bar()`) belong to `Foo`.
    fn receiver(&self, node: Node<'_>, lines: &[&str]) -> Option<String> {
        let declarator = innermost_declarator(node)?;
        if declarator.kind() != "qualified_identifier" {
            return None;
        }
        field_text(declarator, "scope", lines)
    }
}

#[cfg(test)]
mod tests {
    use crate::extract::test_support::{extract, labels};
    use crate::parser::languages::Language;

    #[test]
    fn test_c_functions_through_declarators() {
        let source = r#"#include <stdio.h>
#include "buffer.h"

static int count = 0;

char *dup_name(const char *name) {
    return strdup(name);
}

int main(int argc, char **argv) {
    printf("%d\n", argc);
    return 0;
}
"#;
        let chunks = extract(Language::C, source);
        assert_eq!(
            labels(&chunks),
            vec!["import", "import", "function:dup_name", "function:main"]
        );
        assert_eq!(chunks[0].content, "#include <stdio.h>");
        assert_eq!((chunks[0].start_line, chunks[0].end_line), (0, 0));
        assert_eq!(chunks[1].content, "#include \"buffer.h\"");
        assert_eq!((chunks[1].start_line, chunks[1].end_line), (1, 1));
    }

    #[test]
    fn test_cpp_members_inline_and_out_of_line() {
        let source = r#"#include <string>

using std::string;

class Greeter {
public:
    string greet(const string &who) {
        return "hi " + who;
    }
    int &counter();
};

int &Greeter::counter() {
    static int n = 0;
    return n;
}

struct Point {
    int x;
    int y;
};
"#;
        let chunks = extract(Language::Cpp, source);
        assert_eq!(
            labels(&chunks),
            vec![
                "import",
                "import",
                "class:Greeter",
                "method:greet",
                "method:counter",
                "class:Point",
            ]
        );
        let counter = chunks.iter().find(|c| c.label() == "method:counter").unwrap();
        assert_eq!(counter.parent_context.as_deref(), Some("Greeter"));
        assert_eq!(counter.start_line, 12);
    }
}

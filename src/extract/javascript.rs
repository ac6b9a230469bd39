// SPDX-License-Identifier: MIT OR Apache-2.0

//! JavaScript and TypeScript chunk extraction.
//!
//! Both grammars name classes, functions and methods through the `name`
//! field, so only the taxonomies differ.

use super::{LanguageExtractor, NodeTaxonomy};
use crate::parser::languages::Language;

static JAVASCRIPT: NodeTaxonomy = NodeTaxonomy {
    class_kinds: &["class_declaration"],
    function_kinds: &[
        "function_declaration",
        "generator_function_declaration",
        "method_definition",
    ],
    import_kinds: &["import_statement"],
};

static TYPESCRIPT: NodeTaxonomy = NodeTaxonomy {
    class_kinds: &[
        "class_declaration",
        "abstract_class_declaration",
        "interface_declaration",
    ],
    function_kinds: &[
        "function_declaration",
        "generator_function_declaration",
        "method_definition",
    ],
    import_kinds: &["import_statement"],
};

pub struct JavaScriptExtractor;

impl LanguageExtractor for JavaScriptExtractor {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn taxonomy(&self) -> &'static NodeTaxonomy {
        &JAVASCRIPT
    }
}

pub struct TypeScriptExtractor;

impl LanguageExtractor for TypeScriptExtractor {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn taxonomy(&self) -> &'static NodeTaxonomy {
        &TYPESCRIPT
    }
}

#[cfg(test)]
mod tests {
    use crate::extract::test_support::{extract, labels};
    use crate::parser::languages::Language;

    #[test]
    fn test_javascript_class_and_functions() {
        let source = r#"import { readFile } from "fs";

export class Cache {
  constructor(limit) {
    this.limit = limit;
  }

  get(key) {
    return this.items[key];
  }
}

function* ids() {
  yield 1;
}

export function load(path) {
  const parse = (text) => JSON.parse(text);
  return parse(readFile(path));
}
"#;
        let chunks = extract(Language::JavaScript, source);
        assert_eq!(
            labels(&chunks),
            vec![
                "import",
                "class:Cache",
                "method:constructor",
                "method:get",
                "function:ids",
                "function:load",
            ]
        );
        let get = chunks.iter().find(|c| c.label() == "method:get").unwrap();
        assert_eq!(get.parent_context.as_deref(), Some("Cache"));
        assert_eq!((get.start_line, get.end_line), (7, 9));
    }

    #[test]
    fn test_typescript_interfaces_and_abstract_classes() {
        let source = r#"import type { Shape } from "./shape";

interface Named {
  name(): string;
}

abstract class Base implements Named {
  abstract area(): number;

  name(): string {
    return "base";
  }
}

export class Circle extends Base {
  constructor(private r: number) {
    super();
  }

  area(): number {
    return Math.PI * this.r * this.r;
  }
}
"#;
        let chunks = extract(Language::TypeScript, source);
        assert_eq!(
            labels(&chunks),
            vec![
                "import",
                "class:Named",
                "class:Base",
                "method:name",
                "class:Circle",
                "method:constructor",
                "method:area",
            ]
        );
        let area = chunks.iter().find(|c| c.label() == "method:area").unwrap();
        assert_eq!(area.parent_context.as_deref(), Some("Circle"));
    }
}

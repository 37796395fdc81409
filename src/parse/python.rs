//! Python declaration walker
//!
//! Extracts top-level functions, classes, constants, and type aliases plus
//! import statements. Visibility follows the underscore convention: names
//! starting with `_` are present but not exported.

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor};

use crate::config::ComplexityPolicy;
use crate::core::{ExportRecord, ModuleDescriptor, SymbolKind};

use super::{MAX_ERROR_NODES, MAX_WALK_DEPTH, count_error_nodes, docstring_first_line, finalize,
            is_constant_name};

pub(crate) fn parse(source: &str, path: &str, policy: &ComplexityPolicy) -> ModuleDescriptor {
    parse_inner(source, path, policy).unwrap_or_else(|| {
        eprintln!("Warning: unparseable python source: {}", path);
        ModuleDescriptor::degraded(path)
    })
}

fn parse_inner(source: &str, path: &str, policy: &ComplexityPolicy) -> Option<ModuleDescriptor> {
    let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
    let mut parser = Parser::new();
    parser.set_language(&language).ok()?;
    let tree = parser.parse(source, None)?;
    let root = tree.root_node();

    if count_error_nodes(root) > MAX_ERROR_NODES {
        return None;
    }

    let src = source.as_bytes();
    let mut exports = Vec::new();

    // Top-level declarations only; decorator wrappers unwrap one level.
    let mut stack: Vec<(Node, usize)> = Vec::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        stack.push((child, 0));
    }
    stack.reverse();

    while let Some((node, depth)) = stack.pop() {
        match node.kind() {
            "decorated_definition" => {
                if depth < MAX_WALK_DEPTH
                    && let Some(definition) = node.child_by_field_name("definition")
                {
                    stack.push((definition, depth + 1));
                }
            }
            "function_definition" => {
                if let Some(record) = function_record(node, src) {
                    exports.push(record);
                }
            }
            "class_definition" => {
                if let Some(record) = class_record(node, src) {
                    exports.push(record);
                }
            }
            "expression_statement" => {
                if let Some(record) = assignment_record(node, src) {
                    exports.push(record);
                }
            }
            "type_alias_statement" => {
                if let Some(record) = type_alias_record(node, src) {
                    exports.push(record);
                }
            }
            _ => {}
        }
    }

    let imports = extract_imports(root, src, &language);
    Some(finalize(path, exports, imports, policy))
}

fn text<'a>(node: Node, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

fn function_record(node: Node, src: &[u8]) -> Option<ExportRecord> {
    let name = text(node.child_by_field_name("name")?, src).to_string();
    let params = node
        .child_by_field_name("parameters")
        .map(|p| text(p, src).to_string())?;
    let signature = match node.child_by_field_name("return_type") {
        Some(ret) => format!("{} -> {}", params, text(ret, src)),
        None => params,
    };
    let is_async = node.child(0).is_some_and(|c| c.kind() == "async");
    let is_exported = !name.starts_with('_');

    Some(ExportRecord {
        docstring: body_docstring(node, src),
        line_number: node.start_position().row + 1,
        kind: SymbolKind::Function,
        signature: Some(signature),
        name,
        is_async,
        is_exported,
    })
}

fn class_record(node: Node, src: &[u8]) -> Option<ExportRecord> {
    let name = text(node.child_by_field_name("name")?, src).to_string();
    let signature = node
        .child_by_field_name("superclasses")
        .map(|s| text(s, src).to_string());
    let is_exported = !name.starts_with('_');

    Some(ExportRecord {
        docstring: body_docstring(node, src),
        line_number: node.start_position().row + 1,
        kind: SymbolKind::Class,
        signature,
        name,
        is_async: false,
        is_exported,
    })
}

/// Module-level assignments contribute SCREAMING_CASE constants and
/// `TypeAlias`-annotated bindings; everything else is skipped.
fn assignment_record(stmt: Node, src: &[u8]) -> Option<ExportRecord> {
    let assignment = stmt.named_child(0).filter(|n| n.kind() == "assignment")?;
    let left = assignment.child_by_field_name("left")?;
    if left.kind() != "identifier" {
        return None;
    }
    let name = text(left, src).to_string();

    let annotation = assignment
        .child_by_field_name("type")
        .map(|t| text(t, src).to_string());
    let kind = if annotation.as_deref() == Some("TypeAlias") {
        SymbolKind::Type
    } else if is_constant_name(&name) {
        SymbolKind::Constant
    } else {
        return None;
    };
    let is_exported = !name.starts_with('_');

    Some(ExportRecord {
        kind,
        signature: annotation,
        docstring: None,
        line_number: assignment.start_position().row + 1,
        is_async: false,
        is_exported,
        name,
    })
}

fn type_alias_record(node: Node, src: &[u8]) -> Option<ExportRecord> {
    // `type Vector = list[float]` - the alias name is the first named child
    let name = text(node.named_child(0)?, src).to_string();
    let is_exported = !name.starts_with('_');
    Some(ExportRecord {
        kind: SymbolKind::Type,
        signature: None,
        docstring: None,
        line_number: node.start_position().row + 1,
        is_async: false,
        is_exported,
        name,
    })
}

/// First line of a leading bare string literal in the body, if any.
fn body_docstring(node: Node, src: &[u8]) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let literal = first.named_child(0).filter(|n| n.kind() == "string")?;
    docstring_first_line(text(literal, src))
}

fn extract_imports(root: Node, src: &[u8], language: &tree_sitter::Language) -> Vec<String> {
    let query_str = r#"
        (import_statement name: (_) @import)
        (import_from_statement module_name: (_) @import)
    "#;
    let query = match Query::new(language, query_str) {
        Ok(q) => q,
        Err(_) => return Vec::new(),
    };

    let mut imports = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, root, src);
    while let Some(m) = matches.next() {
        for capture in m.captures {
            if let Ok(raw) = capture.node.utf8_text(src) {
                // "numpy as np" -> "numpy"
                let clean = match raw.find(" as ") {
                    Some(idx) => &raw[..idx],
                    None => raw,
                };
                imports.push(clean.to_string());
            }
        }
    }
    imports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ComplexityTier;

    fn parse_src(source: &str) -> ModuleDescriptor {
        parse(source, "m.py", &ComplexityPolicy::default())
    }

    #[test]
    fn test_exported_and_private_functions() {
        let module = parse_src(
            r#"
def handle(request, timeout=30):
    """Handle one request.

    Longer description.
    """
    return request


def _helper(x):
    return x
"#,
        );
        assert_eq!(module.exports.len(), 2);
        assert_eq!(module.exported().len(), 1);

        let handle = &module.exports[0];
        assert_eq!(handle.name, "handle");
        assert_eq!(handle.kind, SymbolKind::Function);
        assert_eq!(handle.signature.as_deref(), Some("(request, timeout=30)"));
        assert_eq!(handle.docstring.as_deref(), Some("Handle one request."));
        assert_eq!(handle.line_number, 2);
        assert!(handle.is_exported);
        assert!(!module.exports[1].is_exported);
    }

    #[test]
    fn test_async_and_return_annotation() {
        let module = parse_src("async def fetch(url: str) -> bytes:\n    ...\n");
        let fetch = &module.exports[0];
        assert!(fetch.is_async);
        assert_eq!(fetch.signature.as_deref(), Some("(url: str) -> bytes"));
    }

    #[test]
    fn test_class_with_heritage_and_docstring() {
        let module = parse_src(
            r#"
class Store(Base, Mixin):
    '''Key-value store.'''

    def get(self, key):
        return None
"#,
        );
        assert_eq!(module.exports.len(), 1);
        let store = &module.exports[0];
        assert_eq!(store.kind, SymbolKind::Class);
        assert_eq!(store.signature.as_deref(), Some("(Base, Mixin)"));
        assert_eq!(store.docstring.as_deref(), Some("Key-value store."));
        // Methods are not module-level exports
        assert!(!module.exports.iter().any(|e| e.name == "get"));
    }

    #[test]
    fn test_constants_and_type_aliases() {
        let module = parse_src(
            r#"
MAX_RETRIES = 3
_INTERNAL_LIMIT = 10
plain_variable = "skipped"
Row: TypeAlias = dict[str, str]
"#,
        );
        let names: Vec<&str> = module.exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["MAX_RETRIES", "_INTERNAL_LIMIT", "Row"]);
        assert_eq!(module.exports[0].kind, SymbolKind::Constant);
        assert!(module.exports[0].is_exported);
        assert!(!module.exports[1].is_exported);
        assert_eq!(module.exports[2].kind, SymbolKind::Type);
    }

    #[test]
    fn test_decorated_function_is_captured() {
        let module = parse_src("@app.route('/')\ndef index():\n    return 'ok'\n");
        assert_eq!(module.exports.len(), 1);
        assert_eq!(module.exports[0].name, "index");
    }

    #[test]
    fn test_imports_extracted_and_sorted() {
        let module = parse_src(
            r#"
import os
import numpy as np
from utils import helper
from . import sibling
import os
"#,
        );
        assert!(module.imports.contains(&"os".to_string()));
        assert!(module.imports.contains(&"numpy".to_string()));
        assert!(module.imports.contains(&"utils".to_string()));
        assert_eq!(
            module.imports.iter().filter(|i| i.as_str() == "os").count(),
            1
        );
        let mut sorted = module.imports.clone();
        sorted.sort();
        assert_eq!(module.imports, sorted);
    }

    #[test]
    fn test_truncated_source_degrades_to_empty() {
        let garbage = format!(
            "def broken(a, b\n    return a ???\n\nclass Also(:\n{}",
            "))) wat @@@ ::: (((\n".repeat(12)
        );
        let module = parse_src(&garbage);
        assert!(module.exports.is_empty());
        assert!(module.imports.is_empty());
        assert_eq!(module.complexity_tier, ComplexityTier::Low);
    }

    #[test]
    fn test_deeply_nested_source_does_not_overflow() {
        let source = format!("x = {}1{}\n", "(".repeat(400), ")".repeat(400));
        let module = parse_src(&source);
        assert!(module.exports.is_empty());
    }
}

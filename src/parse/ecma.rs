//! TypeScript/JavaScript declaration walker
//!
//! One walker serves both dialects; the dialect picks the grammar
//! (typescript, tsx, or javascript). Visibility follows ES modules: a
//! declaration is exported when it sits under an `export` statement, is
//! named in an `export { ... }` clause, or is assigned through
//! `module.exports` / `exports.*`.

use std::collections::HashSet;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor};

use crate::config::ComplexityPolicy;
use crate::core::{ExportRecord, ModuleDescriptor, SymbolKind};

use super::{MAX_ERROR_NODES, MAX_WALK_DEPTH, count_error_nodes, docstring_first_line, finalize,
            is_constant_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcmaDialect {
    TypeScript,
    JavaScript,
}

impl EcmaDialect {
    fn grammar(self, path: &str) -> tree_sitter::Language {
        match self {
            EcmaDialect::TypeScript if path.ends_with(".tsx") => {
                tree_sitter_typescript::LANGUAGE_TSX.into()
            }
            EcmaDialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            EcmaDialect::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

pub(crate) fn parse(
    dialect: EcmaDialect,
    source: &str,
    path: &str,
    policy: &ComplexityPolicy,
) -> ModuleDescriptor {
    parse_inner(dialect, source, path, policy).unwrap_or_else(|| {
        eprintln!("Warning: unparseable {:?} source: {}", dialect, path);
        ModuleDescriptor::degraded(path)
    })
}

fn parse_inner(
    dialect: EcmaDialect,
    source: &str,
    path: &str,
    policy: &ComplexityPolicy,
) -> Option<ModuleDescriptor> {
    let language = dialect.grammar(path);
    let mut parser = Parser::new();
    parser.set_language(&language).ok()?;
    let tree = parser.parse(source, None)?;
    let root = tree.root_node();

    if count_error_nodes(root) > MAX_ERROR_NODES {
        return None;
    }

    let src = source.as_bytes();
    let mut exports: Vec<ExportRecord> = Vec::new();
    // Names made visible by `export { ... }` or CommonJS assignments
    let mut exported_names: HashSet<String> = HashSet::new();

    let mut stack: Vec<(Node, usize, bool)> = Vec::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        stack.push((child, 0, false));
    }
    stack.reverse();

    while let Some((node, depth, exported)) = stack.pop() {
        match node.kind() {
            "export_statement" => {
                if depth >= MAX_WALK_DEPTH {
                    continue;
                }
                if let Some(declaration) = node.child_by_field_name("declaration") {
                    stack.push((declaration, depth + 1, true));
                }
                let mut clause_cursor = node.walk();
                for child in node.named_children(&mut clause_cursor) {
                    if child.kind() == "export_clause" {
                        collect_export_clause(child, src, &mut exported_names);
                    }
                }
            }
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                if let Some(record) = function_record(node, src, exported) {
                    exports.push(record);
                }
            }
            "class_declaration" | "abstract_class_declaration" => {
                if let Some(record) = class_record(node, src, exported) {
                    exports.push(record);
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                declarator_records(node, src, exported, &mut exports);
            }
            "interface_declaration" | "type_alias_declaration" | "enum_declaration" => {
                if let Some(record) = type_record(node, src, exported) {
                    exports.push(record);
                }
            }
            "expression_statement" => {
                commonjs_exports(node, src, &mut exports, &mut exported_names);
            }
            _ => {}
        }
    }

    for record in &mut exports {
        if exported_names.contains(&record.name) {
            record.is_exported = true;
        }
    }

    let imports = extract_imports(root, src, &language);
    Some(finalize(path, exports, imports, policy))
}

fn text<'a>(node: Node, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

fn is_async(node: Node) -> bool {
    node.child(0).is_some_and(|c| c.kind() == "async")
}

fn function_signature(node: Node, src: &[u8]) -> Option<String> {
    let params = node
        .child_by_field_name("parameters")
        .map(|p| text(p, src).to_string())
        // Single-parameter arrow without parentheses
        .or_else(|| {
            node.child_by_field_name("parameter")
                .map(|p| format!("({})", text(p, src)))
        })?;
    // The TS return annotation node text carries its leading ":"
    Some(match node.child_by_field_name("return_type") {
        Some(ret) => format!("{}{}", params, text(ret, src)),
        None => params,
    })
}

/// Directive-prologue docstring: a bare string literal as the first body
/// statement.
fn body_docstring(node: Node, src: &[u8]) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    if body.kind() != "statement_block" {
        return None;
    }
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let literal = first.named_child(0)?;
    if !matches!(literal.kind(), "string" | "template_string") {
        return None;
    }
    docstring_first_line(text(literal, src))
}

fn function_record(node: Node, src: &[u8], is_exported: bool) -> Option<ExportRecord> {
    let name = text(node.child_by_field_name("name")?, src).to_string();
    Some(ExportRecord {
        signature: function_signature(node, src),
        docstring: body_docstring(node, src),
        line_number: node.start_position().row + 1,
        kind: SymbolKind::Function,
        is_async: is_async(node),
        is_exported,
        name,
    })
}

fn class_record(node: Node, src: &[u8], is_exported: bool) -> Option<ExportRecord> {
    let name = text(node.child_by_field_name("name")?, src).to_string();
    let mut cursor = node.walk();
    let signature = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "class_heritage")
        .map(|h| text(h, src).to_string());
    Some(ExportRecord {
        docstring: None,
        line_number: node.start_position().row + 1,
        kind: SymbolKind::Class,
        is_async: false,
        signature,
        is_exported,
        name,
    })
}

fn type_record(node: Node, src: &[u8], is_exported: bool) -> Option<ExportRecord> {
    let name = text(node.child_by_field_name("name")?, src).to_string();
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

/// `const`/`let`/`var` declarators: function-valued bindings become
/// functions; other `const` bindings (and SCREAMING_CASE `let`/`var`)
/// become constants.
fn declarator_records(node: Node, src: &[u8], is_exported: bool, exports: &mut Vec<ExportRecord>) {
    let is_const = node.child(0).is_some_and(|c| c.kind() == "const");
    let mut cursor = node.walk();
    for declarator in node.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name_node) = declarator.child_by_field_name("name") else {
            continue;
        };
        if name_node.kind() != "identifier" {
            continue;
        }
        let name = text(name_node, src).to_string();
        let value = declarator.child_by_field_name("value");

        if let Some(value) = value.filter(|v| {
            matches!(
                v.kind(),
                "arrow_function" | "function_expression" | "generator_function"
            )
        }) {
            exports.push(ExportRecord {
                signature: function_signature(value, src),
                docstring: body_docstring(value, src),
                line_number: declarator.start_position().row + 1,
                kind: SymbolKind::Function,
                is_async: is_async(value),
                is_exported,
                name,
            });
        } else if is_const || is_constant_name(&name) {
            let annotation = declarator
                .child_by_field_name("type")
                .map(|t| text(t, src).to_string());
            exports.push(ExportRecord {
                kind: SymbolKind::Constant,
                signature: annotation,
                docstring: None,
                line_number: declarator.start_position().row + 1,
                is_async: false,
                is_exported,
                name,
            });
        }
    }
}

fn collect_export_clause(clause: Node, src: &[u8], exported_names: &mut HashSet<String>) {
    let mut cursor = clause.walk();
    for specifier in clause.named_children(&mut cursor) {
        if specifier.kind() != "export_specifier" {
            continue;
        }
        if let Some(name) = specifier.child_by_field_name("name") {
            exported_names.insert(text(name, src).to_string());
        }
    }
}

/// CommonJS surface: `module.exports = {...}`, `module.exports.f = ...`,
/// `exports.f = ...`.
fn commonjs_exports(
    stmt: Node,
    src: &[u8],
    exports: &mut Vec<ExportRecord>,
    exported_names: &mut HashSet<String>,
) {
    let Some(assignment) = stmt
        .named_child(0)
        .filter(|n| n.kind() == "assignment_expression")
    else {
        return;
    };
    let Some(left) = assignment.child_by_field_name("left") else {
        return;
    };
    let Some(right) = assignment.child_by_field_name("right") else {
        return;
    };
    let target = text(left, src);

    if target == "module.exports" {
        if right.kind() == "object" {
            let mut cursor = right.walk();
            for prop in right.named_children(&mut cursor) {
                match prop.kind() {
                    "shorthand_property_identifier" => {
                        exported_names.insert(text(prop, src).to_string());
                    }
                    "pair" => {
                        if let Some(key) = prop.child_by_field_name("key") {
                            exported_names.insert(text(key, src).to_string());
                        }
                    }
                    _ => {}
                }
            }
        } else if right.kind() == "identifier" {
            exported_names.insert(text(right, src).to_string());
        }
        return;
    }

    let member = match target.strip_prefix("module.exports.") {
        Some(m) => m,
        None => match target.strip_prefix("exports.") {
            Some(m) => m,
            None => return,
        },
    };
    if member.contains('.') {
        return;
    }

    if matches!(
        right.kind(),
        "arrow_function" | "function_expression" | "generator_function"
    ) {
        exports.push(ExportRecord {
            name: member.to_string(),
            signature: function_signature(right, src),
            docstring: body_docstring(right, src),
            line_number: assignment.start_position().row + 1,
            kind: SymbolKind::Function,
            is_async: is_async(right),
            is_exported: true,
        });
    } else {
        exported_names.insert(member.to_string());
    }
}

fn extract_imports(root: Node, src: &[u8], language: &tree_sitter::Language) -> Vec<String> {
    let query_str = r#"
        (import_statement source: (string) @import)
        (export_statement source: (string) @import)
        (call_expression function: (identifier) @func arguments: (arguments (string) @import) (#eq? @func "require"))
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
            let capture_name = query.capture_names()[capture.index as usize];
            if capture_name != "import" {
                continue;
            }
            if let Ok(raw) = capture.node.utf8_text(src) {
                let clean = raw.trim_matches(|c| c == '"' || c == '\'' || c == '`');
                imports.push(clean.to_string());
            }
        }
    }
    imports
}

//! Grammar parsers behind one contract
//!
//! Each supported language implements `parse(source, path, policy) ->
//! ModuleDescriptor` by walking its tree-sitter AST for top-level
//! declarations and import statements. Adding a language means adding one
//! more `LanguageParser` variant; nothing else changes.
//!
//! A parse never fails out of this module: grammar errors, as well as trees
//! carrying more than `MAX_ERROR_NODES` syntax-error nodes, degrade to an
//! empty descriptor so callers can distinguish "present but unparseable"
//! from "not a source file". All traversal is iterative and depth-capped.

mod ecma;
mod python;

pub use ecma::EcmaDialect;

use crate::config::ComplexityPolicy;
use crate::core::{ComplexityTier, ExportRecord, Language, ModuleDescriptor};
use dashmap::DashMap;
use tree_sitter::Node;

/// Trees with more error nodes than this are treated as unparseable.
pub const MAX_ERROR_NODES: usize = 10;

/// Traversal stops descending past this depth instead of erroring.
pub const MAX_WALK_DEPTH: usize = 128;

/// Closed set of language grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageParser {
    Python,
    Ecma(EcmaDialect),
}

impl LanguageParser {
    /// Selects the grammar for a scanned language, once, at the
    /// scanner/orchestrator boundary.
    pub fn for_language(language: Language) -> Option<Self> {
        match language {
            Language::Python => Some(LanguageParser::Python),
            Language::TypeScript => Some(LanguageParser::Ecma(EcmaDialect::TypeScript)),
            Language::JavaScript => Some(LanguageParser::Ecma(EcmaDialect::JavaScript)),
            Language::Other => None,
        }
    }

    /// Parse source text into a module descriptor. Never fails; see the
    /// module docs for the degradation rules.
    pub fn parse(
        &self,
        source: &str,
        relative_path: &str,
        policy: &ComplexityPolicy,
    ) -> ModuleDescriptor {
        match self {
            LanguageParser::Python => python::parse(source, relative_path, policy),
            LanguageParser::Ecma(dialect) => ecma::parse(*dialect, source, relative_path, policy),
        }
    }
}

/// Assemble the final descriptor: imports deduplicated and sorted, tier
/// derived from the export count.
pub(crate) fn finalize(
    path: &str,
    exports: Vec<ExportRecord>,
    mut imports: Vec<String>,
    policy: &ComplexityPolicy,
) -> ModuleDescriptor {
    imports.sort();
    imports.dedup();
    let complexity_tier = ComplexityTier::for_export_count(exports.len(), policy);
    ModuleDescriptor {
        path: path.to_string(),
        exports,
        imports,
        complexity_tier,
    }
}

/// Count syntax-error nodes with an explicit stack, stopping past the
/// depth cap rather than overflowing on pathological input.
pub(crate) fn count_error_nodes(root: Node) -> usize {
    let mut count = 0;
    let mut stack: Vec<(Node, usize)> = vec![(root, 0)];
    while let Some((node, depth)) = stack.pop() {
        if node.is_error() || node.is_missing() {
            count += 1;
            if count > MAX_ERROR_NODES {
                return count;
            }
        }
        if depth >= MAX_WALK_DEPTH {
            continue;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push((child, depth + 1));
        }
    }
    count
}

/// First line of a string-literal docstring, quotes stripped.
pub(crate) fn docstring_first_line(raw: &str) -> Option<String> {
    let stripped = raw
        .trim()
        .trim_start_matches(['r', 'b', 'u', 'f', 'R', 'B', 'U', 'F'])
        .trim_matches(|c| c == '"' || c == '\'' || c == '`');
    let line = stripped.lines().map(str::trim).find(|l| !l.is_empty())?;
    Some(line.to_string())
}

/// True for SCREAMING_SNAKE_CASE binding names.
pub(crate) fn is_constant_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[derive(Debug, Clone)]
struct CacheEntry {
    hash: String,
    module: ModuleDescriptor,
}

/// Caller-owned cache of parse results, keyed by relative path and guarded
/// by a content hash. There is no process-wide parser state; create one,
/// pass it into `analyze()`, and `clear()` it whenever you want a cold run.
#[derive(Debug, Default)]
pub struct ParseCache {
    entries: DashMap<String, CacheEntry>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute_hash(content: &str) -> String {
        format!("{:x}", md5::compute(content.as_bytes()))
    }

    /// Returns the cached descriptor if the content hash still matches.
    pub fn get(&self, path: &str, hash: &str) -> Option<ModuleDescriptor> {
        self.entries
            .get(path)
            .filter(|entry| entry.hash == hash)
            .map(|entry| entry.module.clone())
    }

    pub fn insert(&self, path: String, hash: String, module: ModuleDescriptor) {
        self.entries.insert(path, CacheEntry { hash, module });
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Core types shared across Scry modules
//!
//! Everything in this file is part of the wire format: a `RepoSummary` is
//! serialized as a single JSON document and consumed read-only downstream.
//! Field names are camelCase on the wire and nothing here is mutated after
//! the orchestrator returns it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::ComplexityPolicy;

/// Events emitted during the analysis pipeline
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Scanning has started
    StartScanning,
    /// Number of files discovered
    FilesFound(usize),
    /// A file has been parsed
    FileParsed(String),
    /// Non-fatal degradation (parse failure, unreadable manifest, ...)
    Warning(String),
    /// Analysis complete with message
    Complete(String),
    /// Error occurred
    Error(String),
}

/// Source language, classified purely by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
    Other,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "py" | "pyi" => Language::Python,
            "ts" | "tsx" => Language::TypeScript,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            _ => Language::Other,
        }
    }

    /// True if a grammar parser exists for this language
    pub fn is_parseable(self) -> bool {
        !matches!(self, Language::Other)
    }
}

/// Role of a file within the repository, classified by path heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Source,
    Test,
    Config,
    Docs,
}

/// One discovered file with its classification and stat metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Relative, `/`-separated, unique within a summary
    pub path: String,
    pub language: Language,
    pub role: FileRole,
    pub size_bytes: u64,
    pub last_modified: DateTime<Utc>,
}

/// Kind of an exported symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Class,
    Constant,
    Type,
}

/// One top-level declaration extracted from a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub name: String,
    pub kind: SymbolKind,
    /// Textual parameter/return description (or heritage clause for classes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// First line of the leading string-literal docstring, never body text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    /// 1-based
    pub line_number: usize,
    pub is_async: bool,
    pub is_exported: bool,
}

/// Coarse complexity bucket derived from export count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    Low,
    Medium,
    High,
}

impl ComplexityTier {
    pub fn for_export_count(count: usize, policy: &ComplexityPolicy) -> Self {
        if count <= policy.low_max {
            ComplexityTier::Low
        } else if count <= policy.medium_max {
            ComplexityTier::Medium
        } else {
            ComplexityTier::High
        }
    }
}

/// Per-source-file record of declarations and imports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    pub path: String,
    pub exports: Vec<ExportRecord>,
    /// Deduplicated, sorted module-path strings
    pub imports: Vec<String>,
    pub complexity_tier: ComplexityTier,
}

impl ModuleDescriptor {
    /// Empty descriptor for a present-but-unparseable file
    pub fn degraded(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            exports: Vec::new(),
            imports: Vec::new(),
            complexity_tier: ComplexityTier::Low,
        }
    }

    /// The externally visible subset of `exports`
    pub fn exported(&self) -> Vec<&ExportRecord> {
        self.exports.iter().filter(|e| e.is_exported).collect()
    }
}

/// One commit in the recent-history window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub hash: String,
    pub short_hash: String,
    pub author: String,
    /// ISO-8601
    pub date: String,
    pub subject: String,
    pub files_changed: usize,
}

/// Change-frequency record for one source file, used to rank "hot" files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHistoryRecord {
    pub path: String,
    pub commit_count: usize,
    /// ISO-8601 date of the most recent commit touching this file
    pub last_modified: String,
    /// Up to 5 distinct author names
    pub contributors: Vec<String>,
}

/// Version-control snapshot; absent entirely when no backend is detected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub current_commit: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_commit: Option<String>,
    /// Source files differing between the baseline and the working tree
    pub changed_since: Vec<String>,
    pub recent_commits: Vec<CommitRecord>,
    pub file_history: Vec<FileHistoryRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeNodeType {
    File,
    Directory,
}

/// One node of the hierarchical file tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTreeNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub node_type: TreeNodeType,
    /// Directories only; dirs sort before files, then lexicographically
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileTreeNode>>,
    /// Files only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    /// Files only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<FileRole>,
}

/// Detected package ecosystem and its declared tooling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcosystemReport {
    /// "node" or "python"
    pub ecosystem: String,
    /// Manifest file the detection is based on, relative to root
    pub manifest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_framework: Option<String>,
    pub static_typing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInfo {
    pub ecosystems: Vec<EcosystemReport>,
}

/// Root aggregate produced by one `analyze()` call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSummary {
    /// Sorted, deduplicated; never contains `Other`
    pub languages_present: Vec<Language>,
    pub root_path: String,
    pub analyzed_at: DateTime<Utc>,
    pub files: Vec<FileRecord>,
    pub modules: Vec<ModuleDescriptor>,
    pub config_info: ConfigInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_info: Option<RevisionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_tree: Option<FileTreeNode>,
}

/// Relative path with `/` separators, stable across platforms
pub fn wire_path(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("tsx"), Language::TypeScript);
        assert_eq!(Language::from_extension("mjs"), Language::JavaScript);
        assert_eq!(Language::from_extension("md"), Language::Other);
        assert!(!Language::from_extension("toml").is_parseable());
    }

    #[test]
    fn test_complexity_tier_boundaries() {
        let policy = ComplexityPolicy::default();
        assert_eq!(
            ComplexityTier::for_export_count(5, &policy),
            ComplexityTier::Low
        );
        assert_eq!(
            ComplexityTier::for_export_count(6, &policy),
            ComplexityTier::Medium
        );
        assert_eq!(
            ComplexityTier::for_export_count(15, &policy),
            ComplexityTier::Medium
        );
        assert_eq!(
            ComplexityTier::for_export_count(16, &policy),
            ComplexityTier::High
        );
    }

    #[test]
    fn test_exported_filter() {
        let module = ModuleDescriptor {
            path: "a.py".into(),
            exports: vec![
                ExportRecord {
                    name: "run".into(),
                    kind: SymbolKind::Function,
                    signature: None,
                    docstring: None,
                    line_number: 1,
                    is_async: false,
                    is_exported: true,
                },
                ExportRecord {
                    name: "_helper".into(),
                    kind: SymbolKind::Function,
                    signature: None,
                    docstring: None,
                    line_number: 4,
                    is_async: false,
                    is_exported: false,
                },
            ],
            imports: vec![],
            complexity_tier: ComplexityTier::Low,
        };
        assert_eq!(module.exported().len(), 1);
        assert_eq!(module.exported()[0].name, "run");
    }

    #[test]
    fn test_wire_serialization_is_camel_case() {
        let record = FileRecord {
            path: "src/app.ts".into(),
            language: Language::TypeScript,
            role: FileRole::Source,
            size_bytes: 42,
            last_modified: DateTime::<Utc>::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"sizeBytes\":42"));
        assert!(json.contains("\"lastModified\""));
        assert!(json.contains("\"language\":\"typescript\""));
    }
}

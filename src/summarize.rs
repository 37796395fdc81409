//! Orchestrator for the introspection pipeline
//!
//! Sequences scanner, grammar parsers, history collector, config detector,
//! and tree builder into one immutable `RepoSummary`. Two modes, no state
//! across calls: full, and incremental (restricted to a caller-supplied
//! file subset, typically a baseline diff). For fixed on-disk content the
//! incremental `modules` list equals the full list filtered to the subset.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use crossbeam_channel::Sender;
use rayon::prelude::*;
use thiserror::Error;

use crate::config::ScryConfig;
use crate::core::{FileRecord, Language, ModuleDescriptor, RepoSummary, ScanEvent, scan_files,
                  wire_path};
use crate::git::{HistoryLimits, collect_history};
use crate::manifest::detect_config;
use crate::parse::{LanguageParser, ParseCache};
use crate::tree::build_file_tree;

/// The only hard failure `analyze()` can produce; everything below the
/// root degrades per component.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("root path does not exist: {0:?}")]
    RootNotFound(PathBuf),
}

/// Per-call options for `analyze`.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Restrict `files` and parsing to this subset (incremental mode).
    /// History, config detection, and the file tree still cover the full
    /// tree.
    pub only_files: Option<Vec<PathBuf>>,
    /// Revision to diff the working tree against for `changedSince`
    pub baseline_revision: Option<String>,
}

/// Analyze the tree rooted at `config.path` into a `RepoSummary`.
pub fn analyze(
    config: &ScryConfig,
    options: &AnalyzeOptions,
    cache: &ParseCache,
) -> Result<RepoSummary, AnalyzeError> {
    analyze_with_events(config, options, cache, None)
}

/// Like `analyze`, streaming progress events to `tx`.
pub fn analyze_with_events(
    config: &ScryConfig,
    options: &AnalyzeOptions,
    cache: &ParseCache,
    tx: Option<Sender<ScanEvent>>,
) -> Result<RepoSummary, AnalyzeError> {
    let notify = |event: ScanEvent| {
        if let Some(tx) = &tx {
            let _ = tx.send(event);
        }
    };

    let root = config
        .path
        .canonicalize()
        .map_err(|_| AnalyzeError::RootNotFound(config.path.clone()))?;
    let scan_config = ScryConfig {
        path: root.clone(),
        ..config.clone()
    };

    notify(ScanEvent::StartScanning);
    let all_records = match scan_files(&scan_config) {
        Ok(records) => records,
        Err(err) => {
            // Pattern-level walk failures degrade to an empty scan
            notify(ScanEvent::Warning(format!("scan failed: {}", err)));
            Vec::new()
        }
    };
    notify(ScanEvent::FilesFound(all_records.len()));

    let records = match &options.only_files {
        Some(only) => {
            let subset: HashSet<String> = only.iter().map(|p| normalize(p, &root)).collect();
            all_records
                .iter()
                .filter(|r| subset.contains(&r.path))
                .cloned()
                .collect()
        }
        None => all_records.clone(),
    };

    let mut modules: Vec<ModuleDescriptor> = records
        .par_iter()
        .filter(|record| record.language.is_parseable())
        .filter_map(|record| {
            let module = parse_one(&root, record, config, cache)?;
            notify(ScanEvent::FileParsed(record.path.clone()));
            Some(module)
        })
        .collect();
    // Worker-completion order must not leak into output
    modules.sort_by(|a, b| a.path.cmp(&b.path));

    let revision_info = if config.no_history {
        None
    } else {
        let limits = HistoryLimits {
            recent_commits: config.recent_commit_limit,
            walk_commits: config.history_walk_limit,
            hot_files: config.file_history_limit,
        };
        collect_history(&root, options.baseline_revision.as_deref(), &limits)
    };

    let config_info = detect_config(&root);

    // Always over the full tree, even in incremental mode
    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());
    let file_tree = Some(build_file_tree(&root_name, &all_records));

    let mut languages: Vec<Language> = records
        .iter()
        .map(|r| r.language)
        .filter(|l| l.is_parseable())
        .collect();
    languages.sort();
    languages.dedup();

    notify(ScanEvent::Complete(format!(
        "Analyzed {} files, {} modules",
        records.len(),
        modules.len()
    )));

    Ok(RepoSummary {
        languages_present: languages,
        root_path: root.to_string_lossy().into_owned(),
        analyzed_at: Utc::now(),
        files: records,
        modules,
        config_info,
        revision_info,
        file_tree,
    })
}

/// Parse one scanned file. A read failure drops the module (the file
/// record stays); a parse failure degrades inside the grammar parser.
fn parse_one(
    root: &Path,
    record: &FileRecord,
    config: &ScryConfig,
    cache: &ParseCache,
) -> Option<ModuleDescriptor> {
    let parser = LanguageParser::for_language(record.language)?;
    let source = std::fs::read_to_string(root.join(&record.path)).ok()?;

    let hash = ParseCache::compute_hash(&source);
    if let Some(cached) = cache.get(&record.path, &hash) {
        return Some(cached);
    }

    let module = parser.parse(&source, &record.path, &config.complexity);
    cache.insert(record.path.clone(), hash, module.clone());
    Some(module)
}

/// Normalize caller-supplied subset paths to scanner wire paths.
fn normalize(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let relative = relative.strip_prefix("./").unwrap_or(relative);
    wire_path(relative)
}

pub mod config;
pub mod core;
pub mod git;
pub mod manifest;
pub mod parse;
pub mod runner;
pub mod summarize;
pub mod tree;

// Re-export key items for convenience
pub use config::{ComplexityPolicy, ScryConfig};
pub use core::{
    FileRecord, FileRole, FileTreeNode, Language, ModuleDescriptor, RepoSummary, ScanEvent,
};
pub use parse::{LanguageParser, ParseCache};
pub use runner::run;
pub use summarize::{AnalyzeError, AnalyzeOptions, analyze, analyze_with_events};
pub use tree::{build_file_tree, tree_stats, tree_to_string};

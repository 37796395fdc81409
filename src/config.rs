use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Thresholds mapping export counts to complexity tiers.
///
/// `count <= low_max` is low, `count <= medium_max` is medium, anything
/// above is high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityPolicy {
    pub low_max: usize,
    pub medium_max: usize,
}

impl Default for ComplexityPolicy {
    fn default() -> Self {
        Self {
            low_max: 5,
            medium_max: 15,
        }
    }
}

/// Main configuration for scry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScryConfig {
    /// Root of the tree to analyze
    pub path: PathBuf,
    /// Path the serialized summary is written to
    pub output: PathBuf,
    /// List of glob patterns to ignore (e.g. "*.gen.ts")
    pub ignore_patterns: Vec<String>,
    /// List of glob patterns to include (overrides ignore if matched)
    pub include_patterns: Vec<String>,
    /// Skip the history collector entirely
    pub no_history: bool,
    /// Cap on the recent-commit window
    pub recent_commit_limit: usize,
    /// Cap on commits walked for per-file change frequency
    pub history_walk_limit: usize,
    /// Number of hot files to keep in the ranked history list
    pub file_history_limit: usize,
    /// Export-count thresholds for complexity tiers
    pub complexity: ComplexityPolicy,
    /// Enable verbose logging to stdout
    pub verbose: bool,
}

impl ScryConfig {
    /// Validates the configuration, ensuring the root path exists.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.path.exists() {
            anyhow::bail!("Path does not exist: {:?}", self.path);
        }
        Ok(())
    }

    /// Attempts to load configuration from `scry.toml` in the current directory.
    pub fn load_from_file() -> Option<Self> {
        std::fs::read_to_string("scry.toml")
            .ok()
            .and_then(|content| toml::from_str(&content).ok())
    }
}

impl Default for ScryConfig {
    fn default() -> Self {
        let defaults = vec![
            // Version Control
            ".git",
            ".hg",
            ".svn",
            ".bzr",
            // IDEs
            ".idea",
            ".vscode",
            ".vs",
            "*.swp",
            "*.swo",
            // Build / Dependency
            "node_modules",
            "target",
            "dist",
            "build",
            "out",
            "vendor",
            "venv",
            ".venv",
            "env",
            ".tox",
            "__pycache__",
            "*.pyc",
            ".mypy_cache",
            ".pytest_cache",
            ".next",
            "coverage",
            ".nyc_output",
            // Lockfiles
            "package-lock.json",
            "yarn.lock",
            "pnpm-lock.yaml",
            "poetry.lock",
            "uv.lock",
            // Minified / generated artifacts
            "*.min.js",
            "*.min.css",
            "*.bundle.js",
            "*.map",
            // System
            ".DS_Store",
            "Thumbs.db",
            // Logs
            "*.log",
        ];

        Self {
            path: PathBuf::from("."),
            output: PathBuf::from("scry-summary.json"),
            ignore_patterns: defaults.into_iter().map(String::from).collect(),
            include_patterns: Vec::new(),
            no_history: false,
            recent_commit_limit: 20,
            history_walk_limit: 500,
            file_history_limit: 25,
            complexity: ComplexityPolicy::default(),
            verbose: false,
        }
    }
}

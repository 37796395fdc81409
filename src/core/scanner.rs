//! File scanner for discovering and classifying files
//!
//! Walks the root with the standard ignore filters plus the configured
//! exclusion globs, keeps only recognized extensions, and classifies each
//! file by language (extension) and role (path heuristics). Classification
//! does no I/O beyond the single `stat` that fills size and mtime; a failed
//! stat silently drops the file rather than aborting the scan.

use crate::config::ScryConfig;
use crate::core::types::{FileRecord, FileRole, Language, wire_path};
use anyhow::Result;
use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

/// Extensions the scanner recognizes; everything else is skipped entirely.
const RECOGNIZED_EXTENSIONS: &[&str] = &[
    "py", "pyi", "ts", "tsx", "js", "jsx", "mjs", "cjs", "md", "rst", "txt", "json", "toml",
    "yaml", "yml", "cfg", "ini",
];

/// Well-known manifest and tool-settings filenames.
const CONFIG_FILENAMES: &[&str] = &[
    "package.json",
    "tsconfig.json",
    "jsconfig.json",
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
    "requirements.txt",
    "mypy.ini",
    "pytest.ini",
    "tox.ini",
];

lazy_static! {
    static ref TEST_FILENAME_RE: Regex = Regex::new(
        r"(?x)^(
            test_[^/]+\.pyi?
          | [^/]+_test\.py
          | conftest\.py
          | [^/]+\.(test|spec)\.(ts|tsx|js|jsx|mjs|cjs)
        )$"
    )
    .unwrap();
    static ref SETTINGS_FILENAME_RE: Regex =
        Regex::new(r"(?i)(^\.[^/]*rc(\.[a-z]+)?$|config)").unwrap();
}

/// Discover every recognized file under the config root.
///
/// Output is deduplicated and sorted by relative path; callers relying on
/// order get it for free, everyone else is unaffected.
pub fn scan_files(config: &ScryConfig) -> Result<Vec<FileRecord>> {
    let root = config.path.as_path();

    let mut builder = WalkBuilder::new(root);
    let mut override_builder = ignore::overrides::OverrideBuilder::new(root);
    for pattern in &config.ignore_patterns {
        // In the override builder "!pattern" means ignore, "pattern" means whitelist
        override_builder.add(&format!("!{}", pattern))?;
    }
    for pattern in &config.include_patterns {
        override_builder.add(pattern)?;
    }
    builder.overrides(override_builder.build()?);
    builder.standard_filters(true);

    let mut records = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for result in builder.build() {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                eprintln!("Warning: error walking directory: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        if !RECOGNIZED_EXTENSIONS.contains(&extension) {
            continue;
        }

        let relative = match path.strip_prefix(root) {
            Ok(r) => r,
            Err(_) => continue,
        };
        let rel_str = wire_path(relative);
        if !seen.insert(rel_str.clone()) {
            continue;
        }

        // The one stat per file; failure drops the file, never the scan.
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        let last_modified = match metadata.modified() {
            Ok(t) => DateTime::<Utc>::from(t),
            Err(_) => continue,
        };

        records.push(FileRecord {
            language: Language::from_extension(extension),
            role: classify_role(relative),
            size_bytes: metadata.len(),
            last_modified,
            path: rel_str,
        });
    }

    records.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(records)
}

/// Role classification as a pure function of the relative path.
pub fn classify_role(relative: &Path) -> FileRole {
    let filename = relative
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_lowercase();
    let extension = relative
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    let components: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
        .collect();
    let dirs = &components[..components.len().saturating_sub(1)];

    let in_dir = |names: &[&str]| dirs.iter().any(|d| names.contains(&d.as_str()));

    if TEST_FILENAME_RE.is_match(&filename) || in_dir(&["test", "tests", "__tests__"]) {
        return FileRole::Test;
    }
    if CONFIG_FILENAMES.contains(&filename.as_str()) || SETTINGS_FILENAME_RE.is_match(&filename) {
        return FileRole::Config;
    }
    if filename.starts_with("readme")
        || filename.starts_with("changelog")
        || filename.starts_with("contributing")
        || in_dir(&["doc", "docs"])
        || matches!(extension.as_str(), "md" | "rst" | "txt")
    {
        return FileRole::Docs;
    }
    if matches!(extension.as_str(), "json" | "toml" | "yaml" | "yml" | "cfg" | "ini") {
        return FileRole::Config;
    }
    FileRole::Source
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn role(path: &str) -> FileRole {
        classify_role(Path::new(path))
    }

    #[test]
    fn test_role_heuristics() {
        assert_eq!(role("src/app.py"), FileRole::Source);
        assert_eq!(role("src/index.ts"), FileRole::Source);
        assert_eq!(role("test_app.py"), FileRole::Test);
        assert_eq!(role("app_test.py"), FileRole::Test);
        assert_eq!(role("src/api.spec.ts"), FileRole::Test);
        assert_eq!(role("src/api.test.jsx"), FileRole::Test);
        assert_eq!(role("tests/helpers.py"), FileRole::Test);
        assert_eq!(role("__tests__/util.js"), FileRole::Test);
        assert_eq!(role("package.json"), FileRole::Config);
        assert_eq!(role("pyproject.toml"), FileRole::Config);
        assert_eq!(role("setup.py"), FileRole::Config);
        assert_eq!(role(".eslintrc.json"), FileRole::Config);
        assert_eq!(role("jest.config.js"), FileRole::Config);
        assert_eq!(role("ci/deploy.yaml"), FileRole::Config);
        assert_eq!(role("README.md"), FileRole::Docs);
        assert_eq!(role("docs/usage.py"), FileRole::Docs);
        assert_eq!(role("notes.txt"), FileRole::Docs);
    }

    #[test]
    fn test_scan_recognizes_and_excludes() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        fs::create_dir_all(root.join("src"))?;
        fs::create_dir_all(root.join("node_modules/dep"))?;
        fs::write(root.join("src/app.py"), "x = 1\n")?;
        fs::write(root.join("src/app.min.js"), "var a=1;")?;
        fs::write(root.join("node_modules/dep/index.js"), "module.exports={}")?;
        fs::write(root.join("README.md"), "# readme\n")?;
        fs::write(root.join("binary.exe"), [0u8, 1, 2])?;

        let config = ScryConfig {
            path: root.to_path_buf(),
            ..Default::default()
        };
        let records = scan_files(&config)?;
        let paths: Vec<&str> = records.iter().map(|r| r.path.as_str()).collect();

        assert_eq!(paths, vec!["README.md", "src/app.py"]);
        let app = records.iter().find(|r| r.path == "src/app.py").unwrap();
        assert_eq!(app.language, Language::Python);
        assert_eq!(app.role, FileRole::Source);
        assert_eq!(app.size_bytes, 6);
        Ok(())
    }

    #[test]
    fn test_scan_output_sorted_and_unique() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        for name in ["c.py", "a.py", "b.py"] {
            fs::write(root.join(name), "")?;
        }
        let config = ScryConfig {
            path: root.to_path_buf(),
            ..Default::default()
        };
        let records = scan_files(&config)?;
        let paths: Vec<&str> = records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["a.py", "b.py", "c.py"]);

        let unique: HashSet<&&str> = paths.iter().collect();
        assert_eq!(unique.len(), paths.len());
        Ok(())
    }

    #[test]
    fn test_include_patterns_whitelist() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        fs::write(root.join("keep.py"), "")?;
        fs::write(root.join("skip.js"), "")?;

        let config = ScryConfig {
            path: root.to_path_buf(),
            include_patterns: vec!["*.py".to_string()],
            ..Default::default()
        };
        let records = scan_files(&config)?;
        let paths: Vec<PathBuf> = records.iter().map(|r| PathBuf::from(&r.path)).collect();
        assert_eq!(paths, vec![PathBuf::from("keep.py")]);
        Ok(())
    }
}

//! Ecosystem manifest inspection
//!
//! Reports which package ecosystems are present, the declared test
//! framework, and whether static-typing configuration exists. Never
//! throws: a malformed manifest degrades to `None` flags, a missing one
//! to "ecosystem not detected".

use std::path::Path;

use crate::core::{ConfigInfo, EcosystemReport};

const NODE_TEST_FRAMEWORKS: &[&str] = &["jest", "vitest", "mocha", "ava", "jasmine"];
const PYTHON_TEST_FRAMEWORKS: &[&str] = &["pytest", "nose2", "unittest"];

/// Inspect well-known manifests under `root`.
pub fn detect_config(root: &Path) -> ConfigInfo {
    let mut ecosystems = Vec::new();
    if let Some(report) = detect_node(root) {
        ecosystems.push(report);
    }
    if let Some(report) = detect_python(root) {
        ecosystems.push(report);
    }
    ConfigInfo { ecosystems }
}

fn detect_node(root: &Path) -> Option<EcosystemReport> {
    let manifest_path = root.join("package.json");
    let raw = std::fs::read_to_string(&manifest_path).ok()?;
    let manifest: Option<serde_json::Value> = serde_json::from_str(&raw).ok();

    let test_framework = manifest.as_ref().and_then(node_test_framework);
    let static_typing = root.join("tsconfig.json").exists()
        || manifest
            .as_ref()
            .is_some_and(|m| has_node_dependency(m, "typescript"));

    Some(EcosystemReport {
        ecosystem: "node".to_string(),
        manifest: "package.json".to_string(),
        test_framework,
        static_typing,
    })
}

fn has_node_dependency(manifest: &serde_json::Value, name: &str) -> bool {
    ["dependencies", "devDependencies"].iter().any(|section| {
        manifest
            .get(section)
            .and_then(|v| v.as_object())
            .is_some_and(|deps| deps.contains_key(name))
    })
}

fn node_test_framework(manifest: &serde_json::Value) -> Option<String> {
    for framework in NODE_TEST_FRAMEWORKS {
        if has_node_dependency(manifest, framework) {
            return Some((*framework).to_string());
        }
    }
    // Fall back to the test script text
    let script = manifest
        .get("scripts")
        .and_then(|s| s.get("test"))
        .and_then(|v| v.as_str())?;
    NODE_TEST_FRAMEWORKS
        .iter()
        .find(|framework| script.contains(*framework))
        .map(|framework| (*framework).to_string())
}

fn detect_python(root: &Path) -> Option<EcosystemReport> {
    let manifest = ["pyproject.toml", "setup.py", "setup.cfg", "requirements.txt"]
        .into_iter()
        .find(|name| root.join(name).exists())?;

    // Framework/typing hints can live in any of the python config files,
    // not just the primary manifest.
    let mut haystack = String::new();
    for name in [
        "pyproject.toml",
        "setup.py",
        "setup.cfg",
        "requirements.txt",
        "requirements-dev.txt",
    ] {
        if let Ok(text) = std::fs::read_to_string(root.join(name)) {
            haystack.push_str(&text);
            haystack.push('\n');
        }
    }

    let test_framework = if root.join("pytest.ini").exists() {
        Some("pytest".to_string())
    } else {
        PYTHON_TEST_FRAMEWORKS
            .iter()
            .find(|framework| haystack.contains(*framework))
            .map(|framework| (*framework).to_string())
    };

    let pyproject_mypy = std::fs::read_to_string(root.join("pyproject.toml"))
        .ok()
        .and_then(|text| text.parse::<toml::Table>().ok())
        .and_then(|table| table.get("tool").cloned())
        .and_then(|tool| tool.get("mypy").cloned())
        .is_some();
    let static_typing =
        pyproject_mypy || root.join("mypy.ini").exists() || haystack.contains("mypy");

    Some(EcosystemReport {
        ecosystem: "python".to_string(),
        manifest: manifest.to_string(),
        test_framework,
        static_typing,
    })
}

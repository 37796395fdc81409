//! Hierarchical file-tree construction
//!
//! Pure functions over the scanner's flat file list: no I/O. The tree is
//! used for human-readable display and as a structural sanity check: the
//! set of leaf file nodes always equals the input list, one node each.

use std::collections::BTreeMap;

use crate::core::{FileRecord, FileRole, FileTreeNode, Language, TreeNodeType};

/// Build a directory hierarchy from the flat file list, one node per path
/// segment, parents inserted on demand.
pub fn build_file_tree(root_name: &str, files: &[FileRecord]) -> FileTreeNode {
    let mut root = FileTreeNode {
        name: root_name.to_string(),
        path: String::new(),
        node_type: TreeNodeType::Directory,
        children: Some(Vec::new()),
        language: None,
        role: None,
    };

    for record in files {
        insert_path(&mut root, record);
    }
    sort_tree(&mut root);
    root
}

fn insert_path(root: &mut FileTreeNode, record: &FileRecord) {
    let segments: Vec<&str> = record.path.split('/').filter(|s| !s.is_empty()).collect();
    if !segments.is_empty() {
        insert_segments(root, &segments, String::new(), record);
    }
}

fn insert_segments(node: &mut FileTreeNode, segments: &[&str], prefix: String, record: &FileRecord) {
    let segment = segments[0];
    let is_leaf = segments.len() == 1;
    let path = if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", prefix, segment)
    };

    let children = node.children.get_or_insert_with(Vec::new);
    let idx = match children.iter().position(|c| c.name == segment) {
        Some(idx) => idx,
        None => {
            children.push(if is_leaf {
                FileTreeNode {
                    name: segment.to_string(),
                    path: path.clone(),
                    node_type: TreeNodeType::File,
                    children: None,
                    language: Some(record.language),
                    role: Some(record.role),
                }
            } else {
                FileTreeNode {
                    name: segment.to_string(),
                    path: path.clone(),
                    node_type: TreeNodeType::Directory,
                    children: Some(Vec::new()),
                    language: None,
                    role: None,
                }
            });
            children.len() - 1
        }
    };

    if !is_leaf {
        insert_segments(&mut children[idx], &segments[1..], path, record);
    }
}

fn sort_tree(node: &mut FileTreeNode) {
    if let Some(children) = node.children.as_mut() {
        children.sort_by(|a, b| {
            // Dirs first
            let a_dir = a.node_type == TreeNodeType::Directory;
            let b_dir = b.node_type == TreeNodeType::Directory;
            if a_dir != b_dir {
                return b_dir.cmp(&a_dir);
            }
            a.name.cmp(&b.name)
        });
        for child in children {
            sort_tree(child);
        }
    }
}

/// Human-readable indented rendering; directories carry a trailing slash.
pub fn tree_to_string(node: &FileTreeNode) -> String {
    let mut out = String::new();
    render(node, 0, &mut out);
    out
}

fn render(node: &FileTreeNode, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(&node.name);
    if node.node_type == TreeNodeType::Directory {
        out.push('/');
    }
    out.push('\n');
    if let Some(children) = &node.children {
        for child in children {
            render(child, depth + 1, out);
        }
    }
}

/// Aggregate counts for display; not part of the wire contract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeStats {
    /// Directory nodes, not counting the root itself
    pub directories: usize,
    pub files: usize,
    pub by_language: BTreeMap<String, usize>,
    pub by_role: BTreeMap<String, usize>,
}

pub fn tree_stats(node: &FileTreeNode) -> TreeStats {
    let mut stats = TreeStats::default();
    collect_stats(node, true, &mut stats);
    stats
}

fn collect_stats(node: &FileTreeNode, is_root: bool, stats: &mut TreeStats) {
    match node.node_type {
        TreeNodeType::Directory => {
            if !is_root {
                stats.directories += 1;
            }
            if let Some(children) = &node.children {
                for child in children {
                    collect_stats(child, false, stats);
                }
            }
        }
        TreeNodeType::File => {
            stats.files += 1;
            if let Some(language) = node.language {
                *stats
                    .by_language
                    .entry(language_label(language).to_string())
                    .or_insert(0) += 1;
            }
            if let Some(role) = node.role {
                *stats
                    .by_role
                    .entry(role_label(role).to_string())
                    .or_insert(0) += 1;
            }
        }
    }
}

fn language_label(language: Language) -> &'static str {
    match language {
        Language::Python => "python",
        Language::TypeScript => "typescript",
        Language::JavaScript => "javascript",
        Language::Other => "other",
    }
}

fn role_label(role: FileRole) -> &'static str {
    match role {
        FileRole::Source => "source",
        FileRole::Test => "test",
        FileRole::Config => "config",
        FileRole::Docs => "docs",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn record(path: &str, language: Language, role: FileRole) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            language,
            role,
            size_bytes: 0,
            last_modified: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    fn fixture() -> Vec<FileRecord> {
        vec![
            record("zeta.py", Language::Python, FileRole::Source),
            record("src/app.ts", Language::TypeScript, FileRole::Source),
            record("src/util/paths.ts", Language::TypeScript, FileRole::Source),
            record("README.md", Language::Other, FileRole::Docs),
        ]
    }

    fn count_leaves(node: &FileTreeNode) -> usize {
        match node.node_type {
            TreeNodeType::File => 1,
            TreeNodeType::Directory => node
                .children
                .as_ref()
                .map(|c| c.iter().map(count_leaves).sum())
                .unwrap_or(0),
        }
    }

    #[test]
    fn test_leaf_count_matches_input() {
        let files = fixture();
        let tree = build_file_tree("repo", &files);
        assert_eq!(count_leaves(&tree), files.len());
    }

    #[test]
    fn test_directories_sort_before_files() {
        let tree = build_file_tree("repo", &fixture());
        let children = tree.children.as_ref().unwrap();
        let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["src", "README.md", "zeta.py"]);
        assert_eq!(children[0].node_type, TreeNodeType::Directory);

        let src = &children[0];
        let src_names: Vec<&str> = src
            .children
            .as_ref()
            .unwrap()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(src_names, vec!["util", "app.ts"]);
    }

    #[test]
    fn test_node_paths_and_metadata() {
        let tree = build_file_tree("repo", &fixture());
        let src = &tree.children.as_ref().unwrap()[0];
        assert_eq!(src.path, "src");
        let util = &src.children.as_ref().unwrap()[0];
        assert_eq!(util.path, "src/util");
        let paths_file = &util.children.as_ref().unwrap()[0];
        assert_eq!(paths_file.path, "src/util/paths.ts");
        assert_eq!(paths_file.language, Some(Language::TypeScript));
        assert_eq!(paths_file.role, Some(FileRole::Source));
    }

    #[test]
    fn test_tree_to_string_rendering() {
        let tree = build_file_tree("repo", &fixture());
        let rendered = tree_to_string(&tree);
        let expected = "\
repo/
  src/
    util/
      paths.ts
    app.ts
  README.md
  zeta.py
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_tree_stats() {
        let stats = tree_stats(&build_file_tree("repo", &fixture()));
        assert_eq!(stats.directories, 2);
        assert_eq!(stats.files, 4);
        assert_eq!(stats.by_language.get("typescript"), Some(&2));
        assert_eq!(stats.by_language.get("python"), Some(&1));
        assert_eq!(stats.by_role.get("docs"), Some(&1));
        assert_eq!(stats.by_role.get("source"), Some(&3));
    }

    #[test]
    fn test_empty_file_list() {
        let tree = build_file_tree("repo", &[]);
        assert_eq!(count_leaves(&tree), 0);
        assert_eq!(tree_stats(&tree).files, 0);
    }
}

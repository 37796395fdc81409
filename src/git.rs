//! Version-control history mining
//!
//! Everything here is read-only against the repository and degrades to
//! absence: no repository means `None`, and any individual libgit2 call
//! failing leaves that piece of `RevisionInfo` empty rather than aborting
//! the collector.

use chrono::DateTime;
use git2::Repository;
use std::collections::HashMap;
use std::path::Path;

use crate::core::{CommitRecord, FileHistoryRecord, Language, RevisionInfo};

/// Bounds on the history walks.
#[derive(Debug, Clone, Copy)]
pub struct HistoryLimits {
    /// Commits in the recent-history window
    pub recent_commits: usize,
    /// Commits walked for per-file change frequency
    pub walk_commits: usize,
    /// Ranked hot files kept
    pub hot_files: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            recent_commits: 20,
            walk_commits: 500,
            hot_files: 25,
        }
    }
}

const MAX_CONTRIBUTORS: usize = 5;

struct FileChurn {
    commit_count: usize,
    last_modified: String,
    contributors: Vec<String>,
}

/// Collects revision info for the repository at `root`.
/// Returns `None` if the directory is not a git repository.
pub fn collect_history(
    root: &Path,
    baseline: Option<&str>,
    limits: &HistoryLimits,
) -> Option<RevisionInfo> {
    let repo = Repository::open(root).ok()?;

    let head = repo.head().ok()?;
    let head_commit = head.peel_to_commit().ok()?;
    let current_commit = head_commit.id().to_string();
    let branch = head.shorthand().unwrap_or("HEAD").to_string();

    let (recent_commits, file_history) = walk_commits(&repo, limits);
    let (baseline_commit, changed_since) = match baseline {
        Some(rev) => changed_since_baseline(&repo, rev),
        None => (None, Vec::new()),
    };

    Some(RevisionInfo {
        current_commit,
        branch,
        baseline_commit,
        changed_since,
        recent_commits,
        file_history,
    })
}

fn iso_date(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0)
        .map(|d| d.to_rfc3339())
        .unwrap_or_default()
}

fn is_source_path(path: &Path) -> bool {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    Language::from_extension(ext).is_parseable()
}

/// One bounded walk feeds both the recent-commit window and the per-file
/// churn statistics.
fn walk_commits(
    repo: &Repository,
    limits: &HistoryLimits,
) -> (Vec<CommitRecord>, Vec<FileHistoryRecord>) {
    let mut recent = Vec::new();
    let mut churn: HashMap<String, FileChurn> = HashMap::new();

    let mut revwalk = match repo.revwalk() {
        Ok(rw) => rw,
        Err(_) => return (recent, Vec::new()),
    };
    if revwalk.push_head().is_err() {
        return (recent, Vec::new());
    }
    revwalk.set_sorting(git2::Sort::TIME).ok();

    let commit_limit = limits.walk_commits.max(limits.recent_commits);

    for (i, oid) in revwalk.enumerate() {
        if i >= commit_limit {
            break;
        }
        let oid = match oid {
            Ok(o) => o,
            Err(_) => continue,
        };
        let commit = match repo.find_commit(oid) {
            Ok(c) => c,
            Err(_) => continue,
        };
        let tree = match commit.tree() {
            Ok(t) => t,
            Err(_) => continue,
        };
        let parent_tree = commit.parent(0).and_then(|p| p.tree()).ok();

        let diff = match repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None) {
            Ok(d) => d,
            Err(_) => continue,
        };

        let commit_time = commit.time().seconds();
        let author = commit.author().name().unwrap_or("Unknown").to_string();

        if i < limits.recent_commits {
            let hash = oid.to_string();
            recent.push(CommitRecord {
                short_hash: hash.chars().take(7).collect(),
                hash,
                author: author.clone(),
                date: iso_date(commit_time),
                subject: commit.summary().unwrap_or("").to_string(),
                files_changed: diff.deltas().count(),
            });
        }

        if i < limits.walk_commits {
            let _ = diff.foreach(
                &mut |delta, _progress| {
                    if let Some(path) = delta.new_file().path()
                        && is_source_path(path)
                    {
                        let key = path.to_string_lossy().replace('\\', "/");
                        let entry = churn.entry(key).or_insert_with(|| FileChurn {
                            commit_count: 0,
                            // Newest-first walk: the first sighting is the
                            // latest modification.
                            last_modified: iso_date(commit_time),
                            contributors: Vec::new(),
                        });
                        entry.commit_count += 1;
                        if entry.contributors.len() < MAX_CONTRIBUTORS
                            && !entry.contributors.contains(&author)
                        {
                            entry.contributors.push(author.clone());
                        }
                    }
                    true
                },
                None,
                None,
                None,
            );
        }
    }

    let mut file_history: Vec<FileHistoryRecord> = churn
        .into_iter()
        .map(|(path, churn)| FileHistoryRecord {
            path,
            commit_count: churn.commit_count,
            last_modified: churn.last_modified,
            contributors: churn.contributors,
        })
        .collect();
    file_history.sort_by(|a, b| b.commit_count.cmp(&a.commit_count).then(a.path.cmp(&b.path)));
    file_history.truncate(limits.hot_files);

    (recent, file_history)
}

/// Source files differing between the baseline revision and the working
/// tree. An unresolvable baseline degrades to an empty result.
fn changed_since_baseline(repo: &Repository, baseline: &str) -> (Option<String>, Vec<String>) {
    let Ok(target) = repo.revparse_single(baseline) else {
        eprintln!("Warning: cannot resolve baseline revision: {}", baseline);
        return (None, Vec::new());
    };
    let Ok(target_tree) = target.peel_to_tree() else {
        return (None, Vec::new());
    };
    let baseline_commit = target
        .peel_to_commit()
        .map(|c| c.id().to_string())
        .ok();

    let mut opts = git2::DiffOptions::new();
    opts.include_untracked(true).recurse_untracked_dirs(true);
    let Ok(diff) = repo.diff_tree_to_workdir_with_index(Some(&target_tree), Some(&mut opts)) else {
        return (baseline_commit, Vec::new());
    };

    let mut files = Vec::new();
    let _ = diff.foreach(
        &mut |delta, _progress| {
            let path = delta.new_file().path().or_else(|| delta.old_file().path());
            if let Some(path) = path
                && is_source_path(path)
            {
                files.push(path.to_string_lossy().replace('\\', "/"));
            }
            true
        },
        None,
        None,
        None,
    );
    files.sort();
    files.dedup();

    (baseline_commit, files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn commit_all(repo: &Repository, paths: &[&str], message: &str) -> anyhow::Result<git2::Oid> {
        let signature = git2::Signature::now("Test User", "test@example.com")?;
        let mut index = repo.index()?;
        for path in paths {
            index.add_path(Path::new(path))?;
        }
        index.write()?;
        let oid = index.write_tree()?;
        let tree = repo.find_tree(oid)?;
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let commit = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        Ok(commit)
    }

    #[test]
    fn test_no_repository_is_absence() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(collect_history(temp.path(), None, &HistoryLimits::default()).is_none());
    }

    #[test]
    fn test_history_and_baseline_diff() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let root = temp.path();
        let repo = Repository::init(root)?;

        fs::write(root.join("a.py"), "x = 1\n")?;
        commit_all(&repo, &["a.py"], "add a")?;

        fs::write(root.join("a.py"), "x = 2\n")?;
        fs::write(root.join("b.ts"), "export const y = 1;\n")?;
        fs::write(root.join("README.md"), "# docs\n")?;
        commit_all(&repo, &["a.py", "b.ts", "README.md"], "second")?;

        let info = collect_history(root, Some("HEAD~1"), &HistoryLimits::default()).unwrap();

        assert_eq!(info.current_commit.len(), 40);
        assert!(!info.branch.is_empty());
        assert_eq!(info.recent_commits.len(), 2);
        // Newest first
        assert_eq!(info.recent_commits[0].subject, "second");
        assert_eq!(info.recent_commits[0].files_changed, 3);
        assert_eq!(info.recent_commits[0].short_hash.len(), 7);
        assert_eq!(info.recent_commits[1].files_changed, 1);

        // Baseline diff sees source files only
        assert_eq!(info.changed_since, vec!["a.py", "b.ts"]);
        assert!(info.baseline_commit.is_some());

        // a.py touched twice, b.ts once; README.md is not a source file
        let a = info.file_history.iter().find(|f| f.path == "a.py").unwrap();
        assert_eq!(a.commit_count, 2);
        assert_eq!(a.contributors, vec!["Test User".to_string()]);
        let b = info.file_history.iter().find(|f| f.path == "b.ts").unwrap();
        assert_eq!(b.commit_count, 1);
        assert!(!info.file_history.iter().any(|f| f.path == "README.md"));
        assert_eq!(info.file_history[0].path, "a.py");
        Ok(())
    }

    #[test]
    fn test_unresolvable_baseline_degrades() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let root = temp.path();
        let repo = Repository::init(root)?;
        fs::write(root.join("a.py"), "x = 1\n")?;
        commit_all(&repo, &["a.py"], "add a")?;

        let info =
            collect_history(root, Some("no-such-branch"), &HistoryLimits::default()).unwrap();
        assert!(info.baseline_commit.is_none());
        assert!(info.changed_since.is_empty());
        Ok(())
    }

    #[test]
    fn test_uncommitted_workdir_changes_in_baseline_diff() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let root = temp.path();
        let repo = Repository::init(root)?;
        fs::write(root.join("a.py"), "x = 1\n")?;
        commit_all(&repo, &["a.py"], "add a")?;

        // Change the working tree without committing
        fs::write(root.join("a.py"), "x = 99\n")?;
        fs::write(root.join("new.ts"), "export {};\n")?;

        let info = collect_history(root, Some("HEAD"), &HistoryLimits::default()).unwrap();
        assert!(info.changed_since.contains(&"a.py".to_string()));
        assert!(info.changed_since.contains(&"new.ts".to_string()));
        Ok(())
    }

    #[test]
    fn test_recent_commit_window_is_bounded() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let root = temp.path();
        let repo = Repository::init(root)?;
        for i in 0..6 {
            fs::write(root.join("a.py"), format!("x = {}\n", i))?;
            commit_all(&repo, &["a.py"], &format!("change {}", i))?;
        }

        let limits = HistoryLimits {
            recent_commits: 3,
            ..Default::default()
        };
        let info = collect_history(root, None, &limits).unwrap();
        assert_eq!(info.recent_commits.len(), 3);
        let a = info.file_history.iter().find(|f| f.path == "a.py").unwrap();
        assert_eq!(a.commit_count, 6);
        Ok(())
    }

    #[test]
    fn test_paths_are_relative_wire_paths() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let root = temp.path();
        let repo = Repository::init(root)?;
        fs::create_dir_all(root.join("src"))?;
        fs::write(root.join("src/mod.py"), "x = 1\n")?;
        commit_all(&repo, &["src/mod.py"], "add nested")?;

        let info = collect_history(root, None, &HistoryLimits::default()).unwrap();
        assert_eq!(
            info.file_history.iter().map(|f| PathBuf::from(&f.path)).next(),
            Some(PathBuf::from("src/mod.py"))
        );
        Ok(())
    }

    #[test]
    fn test_untracked_new_file_counts_in_workdir_diff() -> anyhow::Result<()> {
        // diff_tree_to_workdir_with_index must see untracked files once
        // they are staged; verify staged-but-uncommitted additions appear.
        let temp = tempfile::TempDir::new()?;
        let root = temp.path();
        let repo = Repository::init(root)?;
        fs::write(root.join("a.py"), "x = 1\n")?;
        commit_all(&repo, &["a.py"], "add a")?;

        fs::write(root.join("staged.py"), "y = 2\n")?;
        let mut index = repo.index()?;
        index.add_path(Path::new("staged.py"))?;
        index.write()?;

        let info = collect_history(root, Some("HEAD"), &HistoryLimits::default()).unwrap();
        assert!(info.changed_since.contains(&"staged.py".to_string()));
        Ok(())
    }
}

//! Candidate-file discovery for the Source Store.
//!
//! Grounded on this crate's `ignore`-based walker: git-ignore-aware
//! traversal via `ignore::WalkBuilder`, then a second filtering pass
//! applying the engine's own include/exclude glob policy: excluded when
//! any exclude pattern matches first, else included when no include
//! patterns are given, else when an include pattern matches.

use glob::Pattern;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

pub struct DiscoveryPolicy {
    pub include: Vec<Pattern>,
    pub exclude: Vec<Pattern>,
}

impl DiscoveryPolicy {
    pub fn new(include: &[String], exclude: &[String]) -> Self {
        Self {
            include: include.iter().filter_map(|p| Pattern::new(p).ok()).collect(),
            exclude: exclude.iter().filter_map(|p| Pattern::new(p).ok()).collect(),
        }
    }

    /// Exact precedence: exclude first, then include-if-empty, then
    /// include-if-matches.
    pub fn admits(&self, relative_path: &Path) -> bool {
        if self.exclude.iter().any(|p| p.matches_path(relative_path)) {
            return false;
        }
        if self.include.is_empty() {
            return true;
        }
        self.include.iter().any(|p| p.matches_path(relative_path))
    }
}

/// Walk `root`, honoring `.gitignore`/global/exclude files, and return
/// every regular file admitted by `policy`, relative to `root`.
pub fn discover(root: &Path, policy: &DiscoveryPolicy) -> Vec<PathBuf> {
    WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .follow_links(false)
        .require_git(false)
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter_map(|entry| {
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            policy.admits(relative).then(|| path.to_path_buf())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn exclude_wins_over_include() {
        let policy = DiscoveryPolicy::new(
            &["**/*.swift".to_string()],
            &["**/Generated/**".to_string()],
        );
        assert!(policy.admits(Path::new("Sources/App.swift")));
        assert!(!policy.admits(Path::new("Sources/Generated/App.swift")));
    }

    #[test]
    fn empty_include_admits_everything_not_excluded() {
        let policy = DiscoveryPolicy::new(&[], &["**/*.generated.swift".to_string()]);
        assert!(policy.admits(Path::new("Sources/App.swift")));
        assert!(!policy.admits(Path::new("Sources/App.generated.swift")));
    }

    #[test]
    fn discover_respects_gitignore() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "ignored.swift\n").unwrap();
        fs::write(dir.path().join("ignored.swift"), "// x").unwrap();
        fs::write(dir.path().join("kept.swift"), "// x").unwrap();

        let policy = DiscoveryPolicy::new(&[], &[]);
        let files = discover(dir.path(), &policy);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("kept.swift"));
    }
}

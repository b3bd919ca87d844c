//! Sync eligibility of working-copy paths.

use crate::ignore::{RuleCompileError, RuleSet};

/// Name of patchsync's own metadata directory inside a working copy.
pub const METADATA_DIR: &str = ".patchsync";

/// Directory names that are never synchronized, whatever the ignore rules say.
pub const BUILTIN_EXCLUDED_DIRS: &[&str] = &[".git", ".hg", ".svn", ".bzr", METADATA_DIR];

/// Normalize a relative path for matching.
///
/// Strips leading `./` and `/`, drops empty and `.` components. `..` is kept
/// as-is; rejecting it is the caller's business.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Decides whether a path participates in synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathClassifier {
    rules: RuleSet,
}

impl PathClassifier {
    /// Create a classifier over compiled rules.
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Compile ignore-file text into a classifier.
    pub fn from_ignore_text(text: &str) -> (Self, Vec<RuleCompileError>) {
        let (rules, errors) = RuleSet::parse(text);
        (Self::new(rules), errors)
    }

    /// The user rules this classifier evaluates.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Whether the user rules exclude `path` (last match wins).
    pub fn is_excluded(&self, path: &str) -> bool {
        self.rules.is_excluded(path)
    }

    /// Whether `path` lies inside version-control or patchsync metadata.
    pub fn is_builtin_excluded(&self, path: &str) -> bool {
        path.split('/')
            .any(|component| BUILTIN_EXCLUDED_DIRS.contains(&component))
    }

    /// Whether `path` should be synchronized.
    ///
    /// Metadata paths are always refused; everything else is decided by the
    /// user rules, defaulting to sync.
    pub fn should_sync(&self, path: &str) -> bool {
        !self.is_builtin_excluded(path) && !self.is_excluded(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_noise() {
        assert_eq!(normalize_path("./src//lib.rs"), "src/lib.rs");
        assert_eq!(normalize_path("/abs/path"), "abs/path");
        assert_eq!(normalize_path("a/./b/"), "a/b");
        assert_eq!(normalize_path("../up"), "../up");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn metadata_is_never_synced() {
        let (classifier, _) = PathClassifier::from_ignore_text("!.git\n!.git/config\n");
        assert!(!classifier.should_sync(".git/config"));
        assert!(!classifier.should_sync("vendor/lib/.hg/store"));
        assert!(!classifier.should_sync(".patchsync/config.toml"));
        assert!(!classifier.should_sync(".svn"));
    }

    #[test]
    fn metadata_lookalikes_are_synced() {
        let classifier = PathClassifier::default();
        assert!(classifier.should_sync(".gitignore"));
        assert!(classifier.should_sync("docs/.github/workflow.yml"));
    }

    #[test]
    fn should_sync_follows_rules() {
        let (classifier, errors) = PathClassifier::from_ignore_text("*.tmp\n!keep.tmp\n");
        assert!(errors.is_empty());
        assert!(classifier.should_sync("keep.tmp"));
        assert!(!classifier.should_sync("scratch.tmp"));
        assert!(classifier.should_sync("src/main.rs"));
    }
}

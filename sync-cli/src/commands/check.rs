//! Report sync eligibility of paths.

use anyhow::Result;
use std::path::Path;
use sync_client::{load_classifier, DEFAULT_IGNORE_FILE};
use sync_core::PathClassifier;

use crate::config::ProjectConfig;

/// Run the check command.
pub async fn run(root: &Path, paths: &[String]) -> Result<()> {
    // An uninitialized working copy still has a .gitignore worth checking.
    let ignore_file = match ProjectConfig::load(root).await {
        Ok(config) => config.ignore_file,
        Err(_) => DEFAULT_IGNORE_FILE.to_string(),
    };
    let classifier = load_classifier(&root.join(&ignore_file)).await?;

    for path in paths {
        println!("{}", verdict(&classifier, path));
    }
    Ok(())
}

/// One report line for `path`.
fn verdict(classifier: &PathClassifier, path: &str) -> String {
    if classifier.is_builtin_excluded(path) {
        return format!("{}: ignored (metadata directory)", path);
    }
    match classifier.rules().deciding_rule(path) {
        None => format!("{}: synced", path),
        Some(rule) if rule.is_negated() => format!(
            "{}: synced (re-included by `!{}`, line {})",
            path,
            rule.pattern(),
            rule.order() + 1
        ),
        Some(rule) => format!(
            "{}: ignored (by `{}`, line {})",
            path,
            rule.pattern(),
            rule.order() + 1
        ),
    }
}

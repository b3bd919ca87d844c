//! Loading ignore rules from disk.

use std::io::ErrorKind;
use std::path::Path;

use sync_core::PathClassifier;

use crate::error::ClientError;

/// Read an ignore file and build a classifier from it.
///
/// A missing file yields the default classifier (built-in exclusions only).
/// Rules that fail to compile are logged and skipped.
pub async fn load_classifier(path: &Path) -> Result<PathClassifier, ClientError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No ignore file, using built-in exclusions only");
            return Ok(PathClassifier::default());
        }
        Err(e) => return Err(ClientError::io(path, e)),
    };

    let (classifier, errors) = PathClassifier::from_ignore_text(&text);
    for error in &errors {
        tracing::warn!(path = %path.display(), line = error.line(), "Skipping ignore rule: {}", error);
    }
    tracing::debug!(
        path = %path.display(),
        rules = classifier.rules().len(),
        rejected = errors.len(),
        "Loaded ignore rules"
    );
    Ok(classifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_gives_default_classifier() {
        let dir = tempdir().unwrap();
        let classifier = load_classifier(&dir.path().join(".gitignore"))
            .await
            .unwrap();
        assert!(classifier.rules().is_empty());
        assert!(classifier.should_sync("anything.txt"));
        assert!(!classifier.should_sync(".git/HEAD"));
    }

    #[tokio::test]
    async fn rules_are_loaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".gitignore");
        tokio::fs::write(&path, "*.log\n!keep.log\nbuild/\n")
            .await
            .unwrap();

        let classifier = load_classifier(&path).await.unwrap();
        assert!(!classifier.should_sync("debug.log"));
        assert!(classifier.should_sync("keep.log"));
        assert!(!classifier.should_sync("build/out.o"));
        assert!(classifier.should_sync("src/main.rs"));
    }

    #[tokio::test]
    async fn bad_rules_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".gitignore");
        tokio::fs::write(&path, "[unclosed\n*.tmp\n").await.unwrap();

        let classifier = load_classifier(&path).await.unwrap();
        assert_eq!(classifier.rules().len(), 1);
        assert!(!classifier.should_sync("x.tmp"));
    }

    #[tokio::test]
    async fn directory_in_place_of_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = load_classifier(dir.path()).await;
        assert!(matches!(result, Err(ClientError::Io { .. })));
    }
}

//! Print the patch between two files.

use anyhow::{Context, Result};
use std::path::Path;
use sync_content::TextPatcher;

/// Run the diff command.
pub async fn run(old: &Path, new: &Path) -> Result<()> {
    let diff = render(old, new).await?;
    if diff.is_empty() {
        println!("(no changes)");
    } else {
        print!("{}", diff);
    }
    Ok(())
}

async fn render(old: &Path, new: &Path) -> Result<String> {
    let old_text = tokio::fs::read_to_string(old)
        .await
        .with_context(|| format!("Failed to read {}", old.display()))?;
    let new_text = tokio::fs::read_to_string(new)
        .await
        .with_context(|| format!("Failed to read {}", new.display()))?;
    Ok(TextPatcher::new().diff(&old_text, &new_text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn renders_unified_hunk() {
        let dir = tempdir().unwrap();
        let old = dir.path().join("old.txt");
        let new = dir.path().join("new.txt");
        tokio::fs::write(&old, "a\nb\n").await.unwrap();
        tokio::fs::write(&new, "a\nc\n").await.unwrap();

        let diff = render(&old, &new).await.unwrap();
        assert!(diff.starts_with("@@ -1,2 +1,2 @@"));
        assert!(diff.contains("-b\n+c\n"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = render(&dir.path().join("a"), &dir.path().join("b")).await;
        assert!(result.is_err());
    }
}

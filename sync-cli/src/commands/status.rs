//! Show project status.

use anyhow::Result;
use std::path::Path;
use sync_client::load_classifier;

use crate::config::ProjectConfig;

/// Run the status command.
pub async fn run(root: &Path) -> Result<()> {
    println!("=== patchsync status ===");
    println!();

    let config = match ProjectConfig::load(root).await {
        Ok(config) => config,
        Err(_) => {
            println!("Project: NOT INITIALIZED");
            println!();
            println!("Run 'patchsync init --project <name> --author <id> --admin <id>' to initialize.");
            return Ok(());
        }
    };

    println!("Project:");
    println!("  Name:   {}", config.project);
    println!("  Author: {}", config.author);
    println!("  Admin:  {}", config.admin);
    println!("  Root:   {}", root.display());
    match config.apply_timeout_secs {
        Some(secs) => println!("  Apply timeout: {}s", secs),
        None => println!("  Apply timeout: none"),
    }

    println!();

    let sync = config.to_sync_config(root)?;
    let ignore_path = sync.ignore_path();
    let classifier = load_classifier(&ignore_path).await?;
    println!("Ignore rules:");
    println!("  File:  {}", ignore_path.display());
    if tokio::fs::try_exists(&ignore_path).await.unwrap_or(false) {
        println!("  Rules: {}", classifier.rules().len());
    } else {
        println!("  Rules: none (file missing)");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init;
    use tempfile::tempdir;

    #[tokio::test]
    async fn status_without_init_succeeds() {
        let dir = tempdir().unwrap();
        run(dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn status_after_init_succeeds() {
        let dir = tempdir().unwrap();
        init::run(dir.path(), "baboon", "alice", "root").await.unwrap();
        tokio::fs::write(dir.path().join(".gitignore"), "*.o\n")
            .await
            .unwrap();
        run(dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn status_without_ignore_file_succeeds() {
        let dir = tempdir().unwrap();
        init::run(dir.path(), "baboon", "alice", "root").await.unwrap();
        assert!(!tokio::fs::try_exists(dir.path().join(".gitignore"))
            .await
            .unwrap());
        run(dir.path()).await.unwrap();
    }
}

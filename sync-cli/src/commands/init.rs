//! Initialize a working copy.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::ProjectConfig;

/// Run the init command.
pub async fn run(root: &Path, project: &str, author: &str, admin: &str) -> Result<()> {
    if !tokio::fs::try_exists(root).await.unwrap_or(false) {
        anyhow::bail!("Working copy {} does not exist", root.display());
    }

    let metadata_dir = ProjectConfig::metadata_dir(root);
    if tokio::fs::try_exists(&metadata_dir).await.unwrap_or(false) {
        anyhow::bail!(
            "Already initialized. Delete {} to reinitialize.",
            metadata_dir.display()
        );
    }

    let config = ProjectConfig::new(project, author, admin);
    config.validate()?;

    tokio::fs::create_dir(&metadata_dir)
        .await
        .context("Failed to create metadata directory")?;
    config.save(root).await?;
    tracing::debug!(path = %ProjectConfig::path(root).display(), "Wrote configuration");

    println!("Initialized patchsync in {}", root.display());
    println!();
    println!("  Project: {}", config.project);
    println!("  Author:  {}", config.author);
    println!("  Admin:   {}", config.admin);
    println!();
    println!("Next steps:");
    println!("  1. Check what will be synced: patchsync check <paths>");
    println!("  2. Publish an edit: patchsync publish <path> --previous <file>");

    Ok(())
}

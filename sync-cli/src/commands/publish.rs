//! Publish the change of a working-copy file.

use anyhow::{Context, Result};
use std::path::Path;
use sync_client::{load_classifier, MockTransport, PatchBroadcaster, PublishOutcome};
use sync_content::TextPatcher;

use crate::batch::decode_batch;
use crate::config::ProjectConfig;

/// Run the publish command.
///
/// Uses the mock transport: the published item is printed, and written to
/// `out` as a batch file when given.
pub async fn run(
    root: &Path,
    path: &str,
    previous: Option<&Path>,
    out: Option<&Path>,
) -> Result<()> {
    let config = ProjectConfig::load(root).await?.to_sync_config(root)?;

    let previous = match previous {
        Some(file) => tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?,
        None => String::new(),
    };

    let classifier = load_classifier(&config.ignore_path()).await?;
    let transport = MockTransport::new();
    let broadcaster =
        PatchBroadcaster::new(config, transport.clone(), TextPatcher::new(), classifier);

    let change = broadcaster
        .publish_file_change(path, &previous)
        .await
        .context("Failed to publish")?;

    match change.outcome {
        PublishOutcome::Ignored => println!("{} is excluded from sync; nothing published", path),
        PublishOutcome::Unchanged => println!("{} is unchanged; nothing published", path),
        PublishOutcome::Published => {
            let batch = decode_batch(&transport.published())?;
            println!("Published {} (mock transport):", path);
            println!("{}", batch);
            if let Some(out) = out {
                tokio::fs::write(out, &batch)
                    .await
                    .with_context(|| format!("Failed to write {}", out.display()))?;
                println!();
                println!("Batch written to {}", out.display());
            }
        }
    }

    Ok(())
}

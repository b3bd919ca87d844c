//! Apply a batch file of received items.

use anyhow::{Context, Result};
use std::path::Path;
use sync_client::{load_classifier, MockTransport, SyncEventHandler};
use sync_content::TextPatcher;
use sync_core::BatchReport;

use crate::batch::encode_batch;
use crate::config::ProjectConfig;

/// Run the apply command.
pub async fn run(root: &Path, batch: &Path) -> Result<()> {
    let report = apply_batch(root, batch).await?;
    print_report(&report);
    Ok(())
}

/// Feed the batch to the inbound handler; notifications go to stdout.
async fn apply_batch(root: &Path, batch: &Path) -> Result<BatchReport> {
    let config = ProjectConfig::load(root).await?.to_sync_config(root)?;
    let json = tokio::fs::read_to_string(batch)
        .await
        .with_context(|| format!("Failed to read {}", batch.display()))?;
    let items = encode_batch(&json)?;

    let classifier = load_classifier(&config.ignore_path()).await?;
    let transport = MockTransport::new();
    let mut handler =
        SyncEventHandler::new(config, transport.clone(), TextPatcher::new(), classifier);

    let report = handler.handle_batch(items).await;

    for (recipient, body) in transport.messages() {
        println!("[to {}] {}", recipient, body);
    }
    Ok(report)
}

fn print_report(report: &BatchReport) {
    println!();
    println!("Batch summary:");
    println!("  Received:   {}", report.received);
    println!("  Clean:      {}", report.clean);
    println!("  Conflict:   {}", report.conflict);
    println!("  Malformed:  {}", report.malformed);
    println!("  Self-echo:  {}", report.self_echo);
    println!("  Failed:     {}", report.failed);
    if report.notify_failed > 0 {
        println!("  Unnotified: {}", report.notify_failed);
    }
}

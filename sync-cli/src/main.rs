//! # patchsync
//!
//! Command-line front end for patchsync.
//!
//! ## Commands
//!
//! - `init`: Create the `.patchsync` metadata directory and config
//! - `check`: Show whether paths take part in sync, and which rule decided
//! - `diff`: Print the patch between two files
//! - `publish`: Diff a working-copy file against its previous content and
//!   publish it (mock transport; the item can be written to a batch file)
//! - `apply`: Run a batch file through the inbound handler
//! - `status`: Show the project configuration
//!
//! ## Example
//!
//! ```bash
//! # Set up a working copy
//! patchsync --root ~/work/baboon init --project baboon --author alice --admin root
//!
//! # Which files are synced?
//! patchsync --root ~/work/baboon check target/debug/app src/main.rs
//!
//! # Publish an edit, then replay it on another peer
//! patchsync --root ~/work/baboon publish src/main.rs --previous /tmp/main.rs.orig --out batch.json
//! patchsync --root ~/work/bob apply batch.json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod batch;
mod commands;
mod config;

use commands::{apply, check, diff, init, publish, status};

/// Peer-to-peer patch synchronization.
#[derive(Parser, Debug)]
#[command(name = "patchsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Root of the working copy
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize patchsync in the working copy
    Init {
        /// Project name shared by all peers
        #[arg(long, short)]
        project: String,

        /// This peer's identity
        #[arg(long, short)]
        author: String,

        /// Recipient of conflict and success notifications
        #[arg(long)]
        admin: String,
    },

    /// Check whether paths would be synced
    Check {
        /// Paths relative to the root
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the patch that turns one file into another
    Diff {
        /// Original file
        old: PathBuf,
        /// Edited file
        new: PathBuf,
    },

    /// Publish the change of a working-copy file
    Publish {
        /// File path relative to the root
        path: String,

        /// File holding the previous content (empty if omitted)
        #[arg(long)]
        previous: Option<PathBuf>,

        /// Write the published item to this batch file
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Apply a batch file of received items
    Apply {
        /// JSON batch file
        batch: PathBuf,
    },

    /// Show project status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init {
            project,
            author,
            admin,
        } => {
            init::run(&cli.root, &project, &author, &admin).await?;
        }
        Commands::Check { paths } => {
            check::run(&cli.root, &paths).await?;
        }
        Commands::Diff { old, new } => {
            diff::run(&old, &new).await?;
        }
        Commands::Publish {
            path,
            previous,
            out,
        } => {
            publish::run(&cli.root, &path, previous.as_deref(), out.as_deref()).await?;
        }
        Commands::Apply { batch } => {
            apply::run(&cli.root, &batch).await?;
        }
        Commands::Status => {
            status::run(&cli.root).await?;
        }
    }

    Ok(())
}

//! # sync-client
//!
//! The I/O side of patchsync: broadcasting local edits and handling patches
//! received from peers.
//!
//! ## Features
//!
//! - **Ignore rules**: `.gitignore`-style rules decide which paths take part
//! - **Inbound handling**: batches are parsed, applied and classified by the
//!   pure state machine from sync-core; conflicts and clean applies are
//!   reported to an admin recipient
//! - **Transport Abstraction**: Pluggable pub/sub layer (mock included)
//! - **Per-path locking**: a local diff+broadcast and an inbound apply never
//!   touch the same file at the same time
//!
//! ## Example
//!
//! ```ignore
//! use sync_client::{MockTransport, PatchBroadcaster, SyncConfig, SyncEventHandler};
//! use sync_content::TextPatcher;
//!
//! let config = SyncConfig::new("baboon", me, admin, "/work/baboon");
//! let classifier = sync_client::load_classifier(&config.ignore_path()).await?;
//! let transport = MockTransport::new();
//!
//! let broadcaster = PatchBroadcaster::new(config.clone(), transport.clone(), TextPatcher::new(), classifier.clone());
//! let mut handler = SyncEventHandler::new(config, transport, TextPatcher::new(), classifier)
//!     .with_locks(broadcaster.locks().clone());
//!
//! broadcaster.publish_edit("src/main.rs", &old, &new).await?;
//! let report = handler.handle_batch(items).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod broadcast;
pub mod config;
pub mod error;
pub mod handler;
pub mod locks;
pub mod patch;
pub mod rules;
pub mod transport;

pub use broadcast::{FileChange, PatchBroadcaster, PublishOutcome};
pub use config::{SyncConfig, DEFAULT_IGNORE_FILE};
pub use error::ClientError;
pub use handler::SyncEventHandler;
pub use locks::{PathGuard, PathLocks};
pub use patch::PatchService;
pub use rules::load_classifier;
pub use transport::{MockTransport, Transport, TransportError};

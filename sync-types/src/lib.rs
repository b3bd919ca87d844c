//! # sync-types
//!
//! Wire format types for patchsync.
//!
//! This crate provides the foundational types used across all patchsync crates:
//! - [`PeerId`] - Published identity of a peer (patch author, admin recipient)
//! - [`PatchEnvelope`] - One peer's edit to one file
//! - [`WireItem`] - Positional field list carried by the pub/sub channel
//! - [`SyncError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod envelope;
mod error;
mod ids;

pub use envelope::{PatchEnvelope, WireItem, FIELD_COUNT, FIELD_NAMES};
pub use error::SyncError;
pub use ids::PeerId;

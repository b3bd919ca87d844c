//! # sync-core
//!
//! Pure logic for patchsync (no I/O, instant tests).
//!
//! This crate implements the ignore-rule compiler, the path classifier and
//! the inbound batch state machine without any network or disk I/O.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (reading ignore files, applying patches, talking to the
//! transport) is performed by `sync-client`, which interprets the actions
//! produced by these state machines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classify;
pub mod ignore;
pub mod inbound;
pub mod outcome;
pub mod parse;

pub use classify::{normalize_path, PathClassifier, BUILTIN_EXCLUDED_DIRS, METADATA_DIR};
pub use ignore::{IgnoreRule, RuleCompileError, RuleSet};
pub use inbound::{
    BatchReport, DropReason, InboundAction, InboundEvent, InboundMachine, InboundPolicy,
    InboundState, ItemDisposition,
};
pub use outcome::{ApplyOutcome, Notification, Verdict};
pub use parse::{parse_item, parse_wire, safe_relative_path, EnvelopeParseError, ParsedItem};

//! CLI command implementations.

pub mod apply;
pub mod check;
pub mod diff;
pub mod init;
pub mod publish;
pub mod status;

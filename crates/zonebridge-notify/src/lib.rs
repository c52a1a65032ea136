//! # Zonebridge NOTIFY Listener
//!
//! Dual-protocol (UDP + TCP) listener for DNS NOTIFY messages (RFC 1996).
//! Inbound messages are parsed, validated as NOTIFY requests, filtered
//! against a hot-reloadable zone allow-list, answered per protocol, and,
//! when permitted, handed to a [`dispatch::NotifyDispatch`] implementation
//! that triggers the local resync.
//!
//! Per-message failures are logged and absorbed; nothing a single peer
//! sends can take the listener down. Dispatch runs in bounded background
//! tasks so a slow resync never blocks the accept loops.

#![warn(missing_docs)]

pub mod dispatch;
pub mod filter;
pub mod handler;
pub mod server;
pub mod tcp;
pub mod udp;

pub use dispatch::{CommandDispatcher, NotifyDispatch};
pub use filter::ZoneAllowList;
pub use handler::NotifyHandler;
pub use server::NotifyServer;

use thiserror::Error;

/// Result type alias for listener operations.
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Errors in the NOTIFY path.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Socket-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed DNS message (dropped silently per message).
    #[error("protocol error: {0}")]
    Proto(#[from] zonebridge_proto::Error),

    /// The resync action failed.
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

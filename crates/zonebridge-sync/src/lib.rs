//! # Zonebridge Reconciliation Engine
//!
//! Turns a locally authored zone definition into the minimal set of remote
//! RRset operations needed to make the remote DNS server match it:
//!
//! - **[`mapper`]**: one parsed zone record to canonical RRset key + content
//! - **[`policy`]**: apex NS rewriting (force / ensure / default)
//! - **[`diff`]**: desired set vs. remote snapshot, producing an ordered change list
//! - **[`lifecycle`]**: zone existence cache and idempotent creation
//! - **[`export`]**: remote RRsets back to zone-file text (inverse of the mapper)
//! - **[`engine`]**: the single-zone sync orchestration tying it together
//!
//! One [`engine::SyncEngine::sync_zone`] call is the unit of retry for the
//! surrounding queue: existence check, snapshot fetch, diff, and one bulk
//! update, in that order, never parallelized within a zone.

#![warn(missing_docs)]

pub mod diff;
pub mod engine;
pub mod export;
pub mod lifecycle;
pub mod mapper;
pub mod policy;

pub use engine::{SyncEngine, SyncReport};
pub use lifecycle::ZoneLifecycle;

use thiserror::Error;
use zonebridge_api::ApiError;

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors from the reconciliation engine.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The configured nameserver policy is unusable (e.g. force/ensure
    /// with an empty list). Rejected before any remote call.
    #[error("invalid nameserver policy: {0}")]
    Policy(String),

    /// The zone definition itself is malformed. Fatal: retrying without
    /// human correction cannot succeed.
    #[error("bad zone data: {0}")]
    BadZoneData(String),

    /// A remote API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SyncError {
    /// Returns true if the surrounding queue should consider retrying.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Api(e) => e.is_recoverable(),
            Self::Policy(_) | Self::BadZoneData(_) => false,
        }
    }
}

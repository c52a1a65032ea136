//! # Zonebridge DNS API Client
//!
//! HTTP client for the remote DNS server's zone management REST API
//! (PowerDNS-compatible). Every request carries the `X-API-Key` header and
//! speaks JSON; errors are classified into recoverable transport failures
//! and fatal request failures so the surrounding queue can decide whether
//! to retry.

#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod types;

pub use client::{DnsApiClient, DnsApiClientBuilder};
pub use error::{ApiError, Result};
pub use types::{ApiRrset, ApiZone, RrsetPatch, RrsetUpdate, ZoneCreate, ZoneSummary};

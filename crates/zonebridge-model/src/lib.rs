//! # Zonebridge Data Model
//!
//! Shared types for both halves of zonebridge: the parsed zone records the
//! control panel produces, the RRset and change-operation shapes the remote
//! DNS API speaks, the nameserver policy, and the transient NOTIFY event.
//!
//! Name handling convention: RRset names are always canonical FQDNs,
//! lower-cased, whitespace-trimmed, with exactly one trailing dot. The
//! [`canonical_fqdn`] and [`strip_trailing_dot`] helpers are the single
//! source of that normalization.

#![warn(missing_docs)]

pub mod notify;
pub mod policy;
pub mod record;
pub mod rrset;

pub use notify::{NotifyEvent, Transport};
pub use policy::{NameserverPolicy, PolicyMode};
pub use record::{RecordData, ResourceRecord};
pub use rrset::{ChangeOp, ChangeVerb, Rrset, RrsetContent, RrsetKey, ZoneSnapshot};

/// TTL applied to an apex NS RRset introduced purely by policy.
pub const POLICY_NS_TTL: u32 = 86_400;

/// Normalizes a name to canonical FQDN form: trimmed, lower-cased, with
/// exactly one trailing dot.
///
/// The root name normalizes to `"."`.
pub fn canonical_fqdn(name: &str) -> String {
    let trimmed = name.trim().trim_end_matches('.').to_ascii_lowercase();
    format!("{trimmed}.")
}

/// Strips the trailing dot from a canonical FQDN, lower-casing and
/// trimming along the way.
pub fn strip_trailing_dot(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_fqdn_normalizes() {
        assert_eq!(canonical_fqdn("Example.COM"), "example.com.");
        assert_eq!(canonical_fqdn("example.com."), "example.com.");
        assert_eq!(canonical_fqdn("  mail.example.com.. "), "mail.example.com.");
        assert_eq!(canonical_fqdn(""), ".");
    }

    #[test]
    fn strip_trailing_dot_normalizes() {
        assert_eq!(strip_trailing_dot("Example.COM."), "example.com");
        assert_eq!(strip_trailing_dot("example.com"), "example.com");
    }
}

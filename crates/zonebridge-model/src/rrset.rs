//! RRsets, change operations, and the remote zone snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of an RRset within a zone: canonical FQDN plus type mnemonic.
///
/// The type is kept as an upper-case string rather than an enum because a
/// remote snapshot can legitimately contain types zonebridge never authors
/// (DNSKEY, NSEC, ...) and those still participate in stale-set deletion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RrsetKey {
    /// Canonical FQDN (lower-case, trailing dot).
    pub name: String,

    /// Upper-case type mnemonic (`A`, `MX`, `SOA`, ...).
    pub rtype: String,
}

impl RrsetKey {
    /// Creates a key, normalizing the name to canonical FQDN form and the
    /// type to upper case.
    pub fn new(name: &str, rtype: &str) -> Self {
        Self {
            name: crate::canonical_fqdn(name),
            rtype: rtype.trim().to_ascii_uppercase(),
        }
    }

    /// Returns true if this key names the apex of `zone_fqdn` with one of
    /// the given types.
    pub fn is_apex_of(&self, zone_fqdn: &str, types: &[&str]) -> bool {
        self.name == crate::canonical_fqdn(zone_fqdn)
            && types.iter().any(|t| self.rtype == *t)
    }
}

impl fmt::Display for RrsetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.rtype)
    }
}

/// One content entry of an RRset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrsetContent {
    /// Serialized record content in the remote API's format.
    pub content: String,

    /// Whether the record is disabled on the remote server.
    #[serde(default)]
    pub disabled: bool,
}

impl RrsetContent {
    /// Creates an enabled content entry.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            disabled: false,
        }
    }
}

/// The set of records sharing one (name, type), with one shared TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rrset {
    /// RRset identity.
    pub key: RrsetKey,

    /// Shared TTL; the first record observed for the key wins.
    pub ttl: u32,

    /// Content entries in authored order.
    pub records: Vec<RrsetContent>,
}

impl Rrset {
    /// Creates an RRset with a single content entry.
    pub fn single(key: RrsetKey, ttl: u32, content: impl Into<String>) -> Self {
        Self {
            key,
            ttl,
            records: vec![RrsetContent::new(content)],
        }
    }

    /// Appends a content entry, keeping the existing TTL.
    pub fn push(&mut self, content: impl Into<String>) {
        self.records.push(RrsetContent::new(content));
    }

    /// Returns true if any content entry equals `content` after
    /// case-insensitive comparison.
    pub fn contains_content(&self, content: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.content.eq_ignore_ascii_case(content))
    }
}

/// The kind of change sent to the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeVerb {
    /// Replace the RRset's full content.
    Replace,

    /// Delete the RRset.
    Delete,
}

impl ChangeVerb {
    /// The remote API's spelling of the verb.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "REPLACE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One RRset mutation in a bulk zone update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOp {
    /// RRset identity.
    pub key: RrsetKey,

    /// The change verb.
    pub verb: ChangeVerb,

    /// TTL for a replace; ignored for deletes.
    pub ttl: u32,

    /// Replacement content; empty for deletes.
    pub records: Vec<RrsetContent>,
}

impl ChangeOp {
    /// Creates a replace operation from a desired RRset.
    pub fn replace(rrset: &Rrset) -> Self {
        Self {
            key: rrset.key.clone(),
            verb: ChangeVerb::Replace,
            ttl: rrset.ttl,
            records: rrset.records.clone(),
        }
    }

    /// Creates a delete operation for a key.
    pub fn delete(key: RrsetKey) -> Self {
        Self {
            key,
            verb: ChangeVerb::Delete,
            ttl: 0,
            records: Vec::new(),
        }
    }
}

/// The remote server's current RRsets for one zone.
///
/// Fetched once per sync operation and discarded afterwards; never
/// persisted.
#[derive(Debug, Clone, Default)]
pub struct ZoneSnapshot {
    rrsets: BTreeMap<RrsetKey, Rrset>,
}

impl ZoneSnapshot {
    /// Builds a snapshot from remote RRsets, collapsing duplicate keys
    /// (first TTL wins, contents merge).
    pub fn from_rrsets(rrsets: impl IntoIterator<Item = Rrset>) -> Self {
        let mut map: BTreeMap<RrsetKey, Rrset> = BTreeMap::new();
        for rrset in rrsets {
            match map.get_mut(&rrset.key) {
                Some(existing) => existing.records.extend(rrset.records),
                None => {
                    map.insert(rrset.key.clone(), rrset);
                }
            }
        }
        Self { rrsets: map }
    }

    /// Returns true if the snapshot holds the key.
    pub fn contains(&self, key: &RrsetKey) -> bool {
        self.rrsets.contains_key(key)
    }

    /// Looks up an RRset by key.
    pub fn get(&self, key: &RrsetKey) -> Option<&Rrset> {
        self.rrsets.get(key)
    }

    /// Iterates the snapshot's keys in deterministic order.
    pub fn keys(&self) -> impl Iterator<Item = &RrsetKey> {
        self.rrsets.keys()
    }

    /// Iterates the snapshot's RRsets in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &Rrset> {
        self.rrsets.values()
    }

    /// Number of RRsets in the snapshot.
    pub fn len(&self) -> usize {
        self.rrsets.len()
    }

    /// Returns true if the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.rrsets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_normalizes() {
        let key = RrsetKey::new(" Mail.Example.COM ", "mx");
        assert_eq!(key.name, "mail.example.com.");
        assert_eq!(key.rtype, "MX");
    }

    #[test]
    fn apex_detection() {
        let ns = RrsetKey::new("example.com", "NS");
        let www = RrsetKey::new("www.example.com", "NS");

        assert!(ns.is_apex_of("example.com.", &["NS", "SOA"]));
        assert!(!ns.is_apex_of("example.com.", &["SOA"]));
        assert!(!www.is_apex_of("example.com.", &["NS", "SOA"]));
    }

    #[test]
    fn snapshot_merges_duplicate_keys() {
        let key = RrsetKey::new("example.com", "A");
        let a = Rrset::single(key.clone(), 300, "192.0.2.1");
        let b = Rrset::single(key.clone(), 600, "192.0.2.2");

        let snapshot = ZoneSnapshot::from_rrsets([a, b]);
        assert_eq!(snapshot.len(), 1);

        let merged = snapshot.get(&key).unwrap();
        assert_eq!(merged.ttl, 300); // first TTL wins
        assert_eq!(merged.records.len(), 2);
    }

    #[test]
    fn contains_content_is_case_insensitive() {
        let rrset = Rrset::single(RrsetKey::new("example.com", "NS"), 86400, "NS1.example.net.");
        assert!(rrset.contains_content("ns1.example.net."));
        assert!(!rrset.contains_content("ns2.example.net."));
    }
}

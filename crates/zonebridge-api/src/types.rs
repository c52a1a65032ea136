//! Wire payloads for the zone management API.

use serde::{Deserialize, Serialize};
use zonebridge_model::{ChangeOp, Rrset, RrsetContent, RrsetKey};

/// An RRset as the remote server reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRrset {
    /// Canonical FQDN.
    pub name: String,

    /// Type mnemonic.
    #[serde(rename = "type")]
    pub rtype: String,

    /// Shared TTL.
    pub ttl: u32,

    /// Content entries.
    pub records: Vec<RrsetContent>,
}

impl From<ApiRrset> for Rrset {
    fn from(api: ApiRrset) -> Self {
        Rrset {
            key: RrsetKey::new(&api.name, &api.rtype),
            ttl: api.ttl,
            records: api.records,
        }
    }
}

/// A full zone as returned by `GET /zones/{fqdn}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiZone {
    /// Server-assigned zone id.
    pub id: String,

    /// Zone FQDN.
    pub name: String,

    /// Zone kind (`Primary`, `Secondary`, `Native`).
    pub kind: String,

    /// Current serial, when the server reports one.
    #[serde(default)]
    pub serial: Option<u64>,

    /// The zone's RRsets.
    #[serde(default)]
    pub rrsets: Vec<ApiRrset>,
}

/// A zone as returned by the `GET /zones` listing (no RRsets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSummary {
    /// Server-assigned zone id.
    pub id: String,

    /// Zone FQDN.
    pub name: String,

    /// Zone kind.
    pub kind: String,

    /// Current serial, when reported.
    #[serde(default)]
    pub serial: Option<u64>,
}

/// Body for `POST /zones`.
///
/// Zones are always created as `Primary`; delegation correctness depends
/// on the remote server answering authoritatively, never as a secondary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneCreate {
    /// Zone FQDN.
    pub name: String,

    /// Always `"Primary"`.
    pub kind: String,

    /// Initial apex nameservers, when a policy supplies them.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub nameservers: Vec<String>,

    /// Initial RRsets; always empty, content arrives via the first patch.
    #[serde(default)]
    pub rrsets: Vec<ApiRrset>,
}

impl ZoneCreate {
    /// Creates a primary-zone creation payload.
    pub fn primary(name: impl Into<String>, nameservers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: "Primary".to_string(),
            nameservers,
            rrsets: Vec::new(),
        }
    }
}

/// One RRset mutation inside a bulk update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrsetPatch {
    /// Canonical FQDN.
    pub name: String,

    /// Type mnemonic.
    #[serde(rename = "type")]
    pub rtype: String,

    /// TTL for replaces; zero for deletes.
    pub ttl: u32,

    /// `REPLACE` or `DELETE`.
    pub changetype: String,

    /// Replacement content; empty for deletes.
    pub records: Vec<RrsetContent>,
}

impl From<&ChangeOp> for RrsetPatch {
    fn from(op: &ChangeOp) -> Self {
        Self {
            name: op.key.name.clone(),
            rtype: op.key.rtype.clone(),
            ttl: op.ttl,
            changetype: op.verb.as_str().to_string(),
            records: op.records.clone(),
        }
    }
}

/// Body for `PATCH /zones/{fqdn}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrsetUpdate {
    /// The RRset mutations to apply.
    pub rrsets: Vec<RrsetPatch>,
}

impl RrsetUpdate {
    /// Builds the update body from a change list.
    pub fn from_ops(ops: &[ChangeOp]) -> Self {
        Self {
            rrsets: ops.iter().map(RrsetPatch::from).collect(),
        }
    }
}

//! Nameserver delegation policy.

use serde::{Deserialize, Serialize};

/// How the apex NS RRset is rewritten during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Replace the apex NS RRset wholesale with the policy list.
    Force,

    /// Keep the zone file's NS entries and append any policy nameservers
    /// not already present.
    Ensure,

    /// Leave NS RRsets untouched.
    #[default]
    Default,
}

impl PolicyMode {
    /// Returns the mode's configuration spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Force => "force",
            Self::Ensure => "ensure",
            Self::Default => "default",
        }
    }
}

/// The delegation policy applied to every reconciled zone.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NameserverPolicy {
    /// Rewrite mode.
    pub mode: PolicyMode,

    /// Ordered canonical nameserver names. May be spelled without the
    /// trailing dot in configuration; consumers normalize on use.
    pub nameservers: Vec<String>,
}

impl NameserverPolicy {
    /// Creates a policy.
    pub fn new(mode: PolicyMode, nameservers: Vec<String>) -> Self {
        Self { mode, nameservers }
    }

    /// Returns true if this policy rewrites NS RRsets at all.
    pub fn is_active(&self) -> bool {
        !matches!(self.mode, PolicyMode::Default)
    }

    /// Returns the policy nameservers in canonical FQDN form, original
    /// order preserved.
    pub fn canonical_nameservers(&self) -> Vec<String> {
        self.nameservers
            .iter()
            .map(|ns| crate::canonical_fqdn(ns))
            .collect()
    }
}

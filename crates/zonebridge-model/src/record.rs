//! Parsed zone-file records.
//!
//! These are the immutable records the external zone-file parser hands to
//! the reconciliation engine. The JSON representation (internally tagged on
//! `type`) doubles as the interchange format the control panel writes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// One record as authored in the control panel's zone definition.
///
/// The `name` may be unqualified (`www`), the apex marker (`@`), or a
/// fully-qualified name with trailing dot; qualification happens in the
/// record mapper, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Record owner name as authored.
    pub name: String,

    /// Time to live in seconds.
    pub ttl: u32,

    /// Type-specific record data.
    #[serde(flatten)]
    pub data: RecordData,
}

impl ResourceRecord {
    /// Creates a record.
    pub fn new(name: impl Into<String>, ttl: u32, data: RecordData) -> Self {
        Self {
            name: name.into(),
            ttl,
            data,
        }
    }

    /// Returns the record's type mnemonic.
    pub fn type_name(&self) -> &str {
        self.data.type_name()
    }
}

/// Type-discriminated record data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum RecordData {
    /// IPv4 address record.
    A {
        /// The address.
        address: Ipv4Addr,
    },

    /// IPv6 address record.
    Aaaa {
        /// The address.
        address: Ipv6Addr,
    },

    /// Canonical name (alias) record.
    Cname {
        /// Alias target, possibly unqualified.
        target: String,
    },

    /// Delegation record.
    Ns {
        /// Nameserver host, possibly unqualified.
        target: String,
    },

    /// Mail exchange record.
    Mx {
        /// Exchange preference (lower wins).
        preference: u16,
        /// Exchange host, possibly unqualified or `@`.
        exchange: String,
    },

    /// Free-form text record.
    Txt {
        /// Raw text data, emitted unmodified.
        text: String,
    },

    /// Service locator record.
    Srv {
        /// Target selection priority.
        priority: u16,
        /// Weight among same-priority targets.
        weight: u16,
        /// Service port.
        port: u16,
        /// Target host; may be empty.
        target: String,
    },

    /// Reverse-mapping pointer record.
    Ptr {
        /// Pointer target.
        target: String,
    },

    /// Start of authority record.
    Soa {
        /// Primary nameserver.
        mname: String,
        /// Responsible mailbox, in domain-name form.
        rname: String,
        /// Zone serial.
        serial: u32,
        /// Secondary refresh interval.
        refresh: u32,
        /// Failed-refresh retry interval.
        retry: u32,
        /// Zone expiry.
        expire: u32,
        /// Negative-caching TTL.
        minimum: u32,
    },

    /// A type the mapper does not handle (CAA, NAPTR, ...), passed through
    /// from the zone-file parser. Logged and skipped during mapping, never
    /// an error.
    Other {
        /// The type mnemonic as parsed.
        rtype: String,
        /// The raw record data.
        rdata: String,
    },
}

impl RecordData {
    /// Returns the record type mnemonic as the remote API spells it.
    pub fn type_name(&self) -> &str {
        match self {
            Self::A { .. } => "A",
            Self::Aaaa { .. } => "AAAA",
            Self::Cname { .. } => "CNAME",
            Self::Ns { .. } => "NS",
            Self::Mx { .. } => "MX",
            Self::Txt { .. } => "TXT",
            Self::Srv { .. } => "SRV",
            Self::Ptr { .. } => "PTR",
            Self::Soa { .. } => "SOA",
            Self::Other { rtype, .. } => rtype,
        }
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.ttl, self.type_name())
    }
}

//! DNS question section.

use crate::error::Result;
use crate::name;
use crate::{Error, QCLASS_IN, QTYPE_SOA};
use bytes::BytesMut;
use std::fmt;

/// A single entry of the question section.
///
/// A NOTIFY request carries exactly one question naming the changed zone,
/// with QTYPE SOA and QCLASS IN (RFC 1996 §3.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// The queried name, in presentation form as received (case preserved,
    /// no trailing dot).
    pub qname: String,

    /// Query type.
    pub qtype: u16,

    /// Query class.
    pub qclass: u16,
}

impl Question {
    /// Creates a SOA/IN question for the given zone, as NOTIFY uses.
    pub fn soa(zone: impl Into<String>) -> Self {
        Self {
            qname: zone.into(),
            qtype: QTYPE_SOA,
            qclass: QCLASS_IN,
        }
    }

    /// Returns the question name normalized for zone matching:
    /// lower-cased, surrounding whitespace and trailing dot stripped.
    pub fn zone_name(&self) -> String {
        self.qname.trim().trim_end_matches('.').to_ascii_lowercase()
    }

    /// Parses a question at `offset`, returning it and the bytes consumed.
    pub fn parse(message: &[u8], offset: usize) -> Result<(Self, usize)> {
        let (qname, name_len) = name::parse_name(message, offset)?;

        let fixed_start = offset + name_len;
        let fixed_end = fixed_start + 4;
        if fixed_end > message.len() {
            return Err(Error::unexpected_eof(fixed_end));
        }

        let qtype = u16::from_be_bytes([message[fixed_start], message[fixed_start + 1]]);
        let qclass = u16::from_be_bytes([message[fixed_start + 2], message[fixed_start + 3]]);

        Ok((Self { qname, qtype, qclass }, name_len + 4))
    }

    /// Appends the question to a buffer in wire format.
    pub fn write_to(&self, buf: &mut BytesMut) -> Result<()> {
        name::write_name(&self.qname, buf)?;
        buf.extend_from_slice(&self.qtype.to_be_bytes());
        buf.extend_from_slice(&self.qclass.to_be_bytes());
        Ok(())
    }

    /// Returns the wire-format length of this question.
    pub fn wire_len(&self) -> usize {
        name::wire_len(&self.qname) + 4
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} type:{} class:{}", self.qname, self.qtype, self.qclass)
    }
}

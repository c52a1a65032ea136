//! DNS message header.
//!
//! The header is a fixed 12-byte structure carrying the transaction ID,
//! the control flags, and the section counts.

use crate::error::{Error, Result};
use crate::opcode::OpCode;
use crate::rcode::Rcode;
use bitflags::bitflags;
use bytes::BytesMut;

/// Size of the DNS header in bytes.
pub const HEADER_SIZE: usize = 12;

bitflags! {
    /// DNS header flag bits (QR/AA/TC/RD/RA), opcode and rcode excluded.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HeaderFlags: u16 {
        /// Query/Response: clear for a query, set for a response.
        const QR = 0x8000;

        /// Authoritative Answer.
        const AA = 0x0400;

        /// Truncation.
        const TC = 0x0200;

        /// Recursion Desired.
        const RD = 0x0100;

        /// Recursion Available.
        const RA = 0x0080;
    }
}

/// DNS message header.
///
/// # Wire Format
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      ID                       |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |QR|   Opcode  |AA|TC|RD|RA| Z|AD|CD|   RCODE   |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    QDCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    ANCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    NSCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    ARCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Transaction identifier, echoed in the response.
    pub id: u16,

    /// Flag bits.
    pub flags: HeaderFlags,

    /// Operation code.
    pub opcode: OpCode,

    /// Response code.
    pub rcode: Rcode,

    /// Number of questions.
    pub qd_count: u16,

    /// Number of answer records.
    pub an_count: u16,

    /// Number of authority records.
    pub ns_count: u16,

    /// Number of additional records.
    pub ar_count: u16,
}

impl Header {
    /// Creates a query header with the given ID and opcode.
    pub const fn new(id: u16, opcode: OpCode) -> Self {
        Self {
            id,
            flags: HeaderFlags::empty(),
            opcode,
            rcode: Rcode::NoError,
            qd_count: 0,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        }
    }

    /// Creates the response header for a request, echoing ID and opcode
    /// and setting the QR bit.
    pub fn response_from(request: &Header) -> Self {
        Self {
            id: request.id,
            flags: HeaderFlags::QR,
            opcode: request.opcode,
            rcode: Rcode::NoError,
            qd_count: request.qd_count,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        }
    }

    /// Returns true if the QR bit is clear (this is a request).
    #[inline]
    pub fn is_query(&self) -> bool {
        !self.flags.contains(HeaderFlags::QR)
    }

    /// Returns true if the QR bit is set (this is a response).
    #[inline]
    pub fn is_response(&self) -> bool {
        self.flags.contains(HeaderFlags::QR)
    }

    /// Returns true if the AA bit is set.
    #[inline]
    pub fn is_authoritative(&self) -> bool {
        self.flags.contains(HeaderFlags::AA)
    }

    /// Sets or clears the AA bit.
    #[inline]
    pub fn set_authoritative(&mut self, aa: bool) {
        self.flags.set(HeaderFlags::AA, aa);
    }

    /// Parses a header from the start of a message.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::buffer_too_short(HEADER_SIZE, data.len()));
        }

        let id = u16::from_be_bytes([data[0], data[1]]);
        let raw_flags = u16::from_be_bytes([data[2], data[3]]);

        let opcode_value = ((raw_flags >> 11) & 0x0F) as u8;
        let opcode =
            OpCode::from_u8(opcode_value).ok_or(Error::InvalidOpCode { value: opcode_value })?;

        let rcode = Rcode::from_u8_lossy((raw_flags & 0x0F) as u8);
        let flags = HeaderFlags::from_bits_truncate(raw_flags);

        Ok(Self {
            id,
            flags,
            opcode,
            rcode,
            qd_count: u16::from_be_bytes([data[4], data[5]]),
            an_count: u16::from_be_bytes([data[6], data[7]]),
            ns_count: u16::from_be_bytes([data[8], data[9]]),
            ar_count: u16::from_be_bytes([data[10], data[11]]),
        })
    }

    /// Serializes the header to wire format.
    pub fn to_wire(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];

        buf[0..2].copy_from_slice(&self.id.to_be_bytes());

        let mut raw_flags = self.flags.bits();
        raw_flags |= u16::from(self.opcode.to_u8()) << 11;
        raw_flags |= u16::from(self.rcode.to_u8());

        buf[2..4].copy_from_slice(&raw_flags.to_be_bytes());
        buf[4..6].copy_from_slice(&self.qd_count.to_be_bytes());
        buf[6..8].copy_from_slice(&self.an_count.to_be_bytes());
        buf[8..10].copy_from_slice(&self.ns_count.to_be_bytes());
        buf[10..12].copy_from_slice(&self.ar_count.to_be_bytes());

        buf
    }

    /// Appends the header to a buffer.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.to_wire());
    }
}

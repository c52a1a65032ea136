//! DNS operation codes.
//!
//! The opcode distinguishes a NOTIFY (RFC 1996) from ordinary queries and
//! the other message kinds that can legitimately arrive on port 53.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// DNS operation code (RFC 1035 §4.1.1, registry per RFC 6895).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OpCode {
    /// Standard query.
    Query = 0,

    /// Inverse query (obsolete, RFC 3425).
    IQuery = 1,

    /// Server status request.
    Status = 2,

    /// Zone change notification (RFC 1996).
    Notify = 4,

    /// Dynamic update (RFC 2136).
    Update = 5,
}

impl OpCode {
    /// Returns the numeric opcode value.
    #[inline]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Creates an opcode from its numeric value.
    ///
    /// Returns `None` for reserved or unassigned values.
    #[inline]
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::try_from(value).ok()
    }

    /// Returns the human-readable opcode name.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Query => "QUERY",
            Self::IQuery => "IQUERY",
            Self::Status => "STATUS",
            Self::Notify => "NOTIFY",
            Self::Update => "UPDATE",
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

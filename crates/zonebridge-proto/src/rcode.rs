//! DNS response codes.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// DNS response code (the 4-bit RCODE field, RFC 1035 §4.1.1).
///
/// The listener only ever sends `NoError`; the rest exist so inbound
/// responses can be rendered usefully in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Rcode {
    /// No error.
    NoError = 0,

    /// Format error.
    FormErr = 1,

    /// Server failure.
    ServFail = 2,

    /// Name does not exist.
    NxDomain = 3,

    /// Operation not implemented.
    NotImp = 4,

    /// Operation refused by policy.
    Refused = 5,
}

impl Rcode {
    /// Returns the numeric rcode value.
    #[inline]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Creates an rcode from the low 4 bits, defaulting to `ServFail`
    /// for values outside the handled range.
    #[inline]
    pub fn from_u8_lossy(value: u8) -> Self {
        Self::try_from(value & 0x0F).unwrap_or(Self::ServFail)
    }

    /// Returns the conventional rcode mnemonic.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoError => "NOERROR",
            Self::FormErr => "FORMERR",
            Self::ServFail => "SERVFAIL",
            Self::NxDomain => "NXDOMAIN",
            Self::NotImp => "NOTIMP",
            Self::Refused => "REFUSED",
        }
    }
}

impl std::fmt::Display for Rcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rcode_roundtrip() {
        assert_eq!(Rcode::from_u8_lossy(0), Rcode::NoError);
        assert_eq!(Rcode::from_u8_lossy(3), Rcode::NxDomain);
        assert_eq!(Rcode::from_u8_lossy(9), Rcode::ServFail); // out of range
    }

    #[test]
    fn rcode_display() {
        assert_eq!(Rcode::NoError.to_string(), "NOERROR");
        assert_eq!(Rcode::Refused.to_string(), "REFUSED");
    }
}

//! Protocol error types.

use thiserror::Error;

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing or building DNS messages.
///
/// Every variant here describes a malformed or oversized message; the
/// listener's policy for all of them is the same: drop the message, close
/// the connection if there is one, keep serving.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Buffer is too short to contain the expected structure.
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort {
        /// Expected minimum size.
        expected: usize,
        /// Actual buffer size.
        actual: usize,
    },

    /// Ran off the end of the message mid-structure.
    #[error("unexpected end of message at offset {offset}")]
    UnexpectedEof {
        /// Byte offset where data ran out.
        offset: usize,
    },

    /// A label length byte uses a reserved encoding.
    #[error("invalid label type 0x{value:02X} at offset {offset}")]
    InvalidLabelType {
        /// Offset of the length byte.
        offset: usize,
        /// The offending byte.
        value: u8,
    },

    /// A label exceeds the 63-byte limit.
    #[error("label too long: {length} bytes exceeds maximum of 63")]
    LabelTooLong {
        /// Actual label length.
        length: usize,
    },

    /// A name exceeds the 255-byte limit.
    #[error("name too long: {length} bytes exceeds maximum of 255")]
    NameTooLong {
        /// Accumulated name length.
        length: usize,
    },

    /// A compression pointer points forward or at itself.
    #[error("invalid compression pointer at offset {offset}: points to {target}")]
    InvalidPointer {
        /// Offset of the pointer.
        offset: usize,
        /// Target offset.
        target: usize,
    },

    /// Too many compression pointer jumps (loop protection).
    #[error("too many compression pointer jumps (>{max})")]
    TooManyPointerJumps {
        /// Jump budget that was exhausted.
        max: usize,
    },

    /// The opcode field holds an unassigned value.
    #[error("invalid opcode: {value}")]
    InvalidOpCode {
        /// The raw opcode value.
        value: u8,
    },

    /// A message that should carry a question carries none.
    #[error("message has no question section")]
    MissingQuestion,

    /// A label contains bytes that are not printable ASCII.
    #[error("non-ASCII byte 0x{value:02X} in label at offset {offset}")]
    InvalidLabelByte {
        /// Offset of the byte.
        offset: usize,
        /// The offending byte.
        value: u8,
    },
}

impl Error {
    /// Creates a new `BufferTooShort` error.
    #[inline]
    pub fn buffer_too_short(expected: usize, actual: usize) -> Self {
        Self::BufferTooShort { expected, actual }
    }

    /// Creates a new `UnexpectedEof` error.
    #[inline]
    pub fn unexpected_eof(offset: usize) -> Self {
        Self::UnexpectedEof { offset }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::buffer_too_short(12, 4);
        assert_eq!(
            err.to_string(),
            "buffer too short: expected at least 12 bytes, got 4"
        );

        let err = Error::InvalidPointer { offset: 14, target: 20 };
        assert_eq!(
            err.to_string(),
            "invalid compression pointer at offset 14: points to 20"
        );
    }
}

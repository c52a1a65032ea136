//! Domain name parsing and serialization.
//!
//! Names are handled in presentation form (dotted strings without the
//! trailing root dot): the listener only ever needs the textual zone name
//! from a question, so there is no separate wire-form name type. Parsing
//! follows compression pointers (RFC 1035 §4.1.4) with backward-only
//! targets and a jump budget for loop protection.

use crate::error::{Error, Result};
use crate::{MAX_LABEL_LENGTH, MAX_NAME_LENGTH};
use bytes::BytesMut;

/// Maximum number of compression pointer jumps before giving up.
const MAX_POINTER_JUMPS: usize = 32;

/// Parses a domain name starting at `offset` within `message`.
///
/// Returns the name in presentation form (labels joined with `.`, no
/// trailing dot, original case preserved) and the number of bytes consumed
/// at the starting position; pointer targets are followed but do not count
/// toward consumption.
pub fn parse_name(message: &[u8], offset: usize) -> Result<(String, usize)> {
    let mut name = String::new();
    let mut pos = offset;
    let mut consumed = 0;
    let mut followed_pointer = false;
    let mut jumps = 0;
    let mut total_len = 0usize;

    loop {
        let len_byte = *message.get(pos).ok_or(Error::unexpected_eof(pos))?;

        // Compression pointer: top two bits set.
        if len_byte >= 0xC0 {
            let low = *message.get(pos + 1).ok_or(Error::unexpected_eof(pos + 1))?;
            let target = usize::from(u16::from_be_bytes([len_byte & 0x3F, low]));

            if target >= pos {
                return Err(Error::InvalidPointer { offset: pos, target });
            }

            if !followed_pointer {
                consumed = pos - offset + 2;
                followed_pointer = true;
            }

            jumps += 1;
            if jumps > MAX_POINTER_JUMPS {
                return Err(Error::TooManyPointerJumps { max: MAX_POINTER_JUMPS });
            }

            pos = target;
            continue;
        }

        // Reserved label types 0x40..0xBF.
        if len_byte >= 0x40 {
            return Err(Error::InvalidLabelType { offset: pos, value: len_byte });
        }

        let len = len_byte as usize;

        // Root label terminates the name.
        if len == 0 {
            if !followed_pointer {
                consumed = pos - offset + 1;
            }
            return Ok((name, consumed));
        }

        if len > MAX_LABEL_LENGTH {
            return Err(Error::LabelTooLong { length: len });
        }

        total_len += 1 + len;
        if total_len > MAX_NAME_LENGTH {
            return Err(Error::NameTooLong { length: total_len });
        }

        let end = pos + 1 + len;
        if end > message.len() {
            return Err(Error::unexpected_eof(end));
        }

        if !name.is_empty() {
            name.push('.');
        }
        for (i, &byte) in message[pos + 1..end].iter().enumerate() {
            if !byte.is_ascii() || byte == 0 {
                return Err(Error::InvalidLabelByte { offset: pos + 1 + i, value: byte });
            }
            name.push(char::from(byte));
        }

        pos = end;
    }
}

/// Writes a presentation-form name to the buffer in uncompressed wire
/// format, terminated by the root label.
///
/// Empty labels produced by doubled or trailing dots are skipped, so both
/// `example.com` and `example.com.` serialize identically.
pub fn write_name(name: &str, buf: &mut BytesMut) -> Result<()> {
    let mut total_len = 0usize;

    for label in name.split('.') {
        if label.is_empty() {
            continue;
        }
        if label.len() > MAX_LABEL_LENGTH {
            return Err(Error::LabelTooLong { length: label.len() });
        }
        total_len += 1 + label.len();
        if total_len > MAX_NAME_LENGTH {
            return Err(Error::NameTooLong { length: total_len });
        }

        buf.extend_from_slice(&[label.len() as u8]);
        buf.extend_from_slice(label.as_bytes());
    }

    buf.extend_from_slice(&[0]);
    Ok(())
}

/// Returns the wire length of a presentation-form name, including the
/// terminating root label.
pub fn wire_len(name: &str) -> usize {
    let labels: usize = name
        .split('.')
        .filter(|l| !l.is_empty())
        .map(|l| 1 + l.len())
        .sum();
    labels + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_name() {
        let wire = [
            3, b'w', b'w', b'w', 7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm',
            0,
        ];

        let (name, consumed) = parse_name(&wire, 0).unwrap();
        assert_eq!(name, "www.example.com");
        assert_eq!(consumed, wire.len());
    }

    #[test]
    fn parse_root_name() {
        let wire = [0u8];
        let (name, consumed) = parse_name(&wire, 0).unwrap();
        assert_eq!(name, "");
        assert_eq!(consumed, 1);
    }

    #[test]
    fn parse_compressed_name() {
        // offset 0: example.com.   offset 13: www.<ptr to 0>
        let wire = [
            7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0, // example.com
            3, b'w', b'w', b'w', 0xC0, 0x00, // www.<ptr>
        ];

        let (name, consumed) = parse_name(&wire, 13).unwrap();
        assert_eq!(name, "www.example.com");
        assert_eq!(consumed, 6); // "www" label plus 2-byte pointer
    }

    #[test]
    fn parse_rejects_forward_pointer() {
        let wire = [0xC0, 0x00];
        assert!(matches!(
            parse_name(&wire, 0),
            Err(Error::InvalidPointer { .. })
        ));
    }

    #[test]
    fn parse_rejects_truncated_label() {
        let wire = [5, b'a', b'b'];
        assert!(matches!(
            parse_name(&wire, 0),
            Err(Error::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn write_then_parse_roundtrip() {
        let mut buf = BytesMut::new();
        write_name("Sub.Example.COM", &mut buf).unwrap();

        let (name, consumed) = parse_name(&buf, 0).unwrap();
        assert_eq!(name, "Sub.Example.COM");
        assert_eq!(consumed, buf.len());
        assert_eq!(consumed, wire_len("Sub.Example.COM"));
    }

    #[test]
    fn write_ignores_trailing_dot() {
        let mut with_dot = BytesMut::new();
        let mut without_dot = BytesMut::new();
        write_name("example.com.", &mut with_dot).unwrap();
        write_name("example.com", &mut without_dot).unwrap();
        assert_eq!(with_dot, without_dot);
    }

    #[test]
    fn write_rejects_long_label() {
        let label = "a".repeat(64);
        let mut buf = BytesMut::new();
        assert!(matches!(
            write_name(&label, &mut buf),
            Err(Error::LabelTooLong { length: 64 })
        ));
    }
}

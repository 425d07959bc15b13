//! Atomic wire field types for newc headers.
//!
//! Every header is a flat sequence of four field kinds: fixed-width hex
//! integers, NUL-terminated names, raw blobs, and alignment pads. Each kind
//! knows how to append its own wire representation to a growing byte buffer;
//! only the alignment pad reads buffer state (its current length).

/// The value of a single header field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Unsigned 32-bit integer, packed as exactly 8 uppercase ASCII hex
    /// digits, zero-padded on the left.
    ///
    /// `value: None` means the field was never explicitly set and packs the
    /// schema `default` instead. Values are `u32` by construction; wider
    /// inputs must be rejected at the conversion site, never truncated.
    Hex { value: Option<u32>, default: u32 },

    /// Byte content followed by one NUL terminator. An empty name packs
    /// nothing at all (not even the NUL).
    Name(String),

    /// Raw bytes, verbatim. Lengths are carried by separate hex fields
    /// (`filesize`, `namesize`), never inline.
    Blob(Vec<u8>),

    /// Zero or more NUL bytes padding the buffer to a multiple of the given
    /// boundary. A no-op when the buffer is already aligned.
    Align(usize),
}

impl FieldValue {
    /// Append this field's wire representation to `buf`.
    pub fn pack(&self, buf: &mut Vec<u8>) {
        match self {
            FieldValue::Hex { value, default } => {
                let v = value.unwrap_or(*default);
                buf.extend_from_slice(format!("{v:08X}").as_bytes());
            }
            FieldValue::Name(name) => {
                if !name.is_empty() {
                    buf.extend_from_slice(name.as_bytes());
                    buf.push(0);
                }
            }
            FieldValue::Blob(bytes) => buf.extend_from_slice(bytes),
            FieldValue::Align(boundary) => {
                let pad = (boundary - buf.len() % boundary) % boundary;
                buf.extend(std::iter::repeat(0u8).take(pad));
            }
        }
    }
}

/// A named header field.
///
/// An entry's schema is an ordered list of these; the list order is the wire
/// order, fixed when the entry is constructed.
#[derive(Debug, Clone)]
pub struct HeaderField {
    pub name: &'static str,
    pub value: FieldValue,
}

impl HeaderField {
    /// An unset hex field that packs `default` until a value is written.
    pub fn hex(name: &'static str, default: u32) -> Self {
        Self {
            name,
            value: FieldValue::Hex {
                value: None,
                default,
            },
        }
    }

    /// A hex field holding an explicitly set value.
    pub fn hex_set(name: &'static str, value: u32) -> Self {
        Self {
            name,
            value: FieldValue::Hex {
                value: Some(value),
                default: 0,
            },
        }
    }

    /// A NUL-terminated name field.
    pub fn name(name: &'static str, value: String) -> Self {
        Self {
            name,
            value: FieldValue::Name(value),
        }
    }

    /// A raw byte field.
    pub fn blob(name: &'static str, value: Vec<u8>) -> Self {
        Self {
            name,
            value: FieldValue::Blob(value),
        }
    }

    /// An alignment pad to a multiple of `boundary` bytes.
    pub fn align(name: &'static str, boundary: usize) -> Self {
        Self {
            name,
            value: FieldValue::Align(boundary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_packs_eight_uppercase_digits() {
        let mut buf = Vec::new();
        FieldValue::Hex {
            value: Some(0xDEADBEEF),
            default: 0,
        }
        .pack(&mut buf);
        assert_eq!(buf, b"DEADBEEF");

        buf.clear();
        FieldValue::Hex {
            value: Some(2),
            default: 0,
        }
        .pack(&mut buf);
        assert_eq!(buf, b"00000002");
    }

    #[test]
    fn test_hex_falls_back_to_default_when_unset() {
        let mut buf = Vec::new();
        FieldValue::Hex {
            value: None,
            default: 1,
        }
        .pack(&mut buf);
        assert_eq!(buf, b"00000001");

        // An explicit value wins over the default.
        buf.clear();
        FieldValue::Hex {
            value: Some(0),
            default: 1,
        }
        .pack(&mut buf);
        assert_eq!(buf, b"00000000");
    }

    #[test]
    fn test_name_is_nul_terminated() {
        let mut buf = Vec::new();
        FieldValue::Name("a.txt".to_string()).pack(&mut buf);
        assert_eq!(buf, b"a.txt\0");
    }

    #[test]
    fn test_empty_name_packs_nothing() {
        let mut buf = Vec::new();
        FieldValue::Name(String::new()).pack(&mut buf);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_blob_is_verbatim() {
        let mut buf = vec![1u8];
        FieldValue::Blob(b"hi\0there".to_vec()).pack(&mut buf);
        assert_eq!(buf, b"\x01hi\0there");
    }

    #[test]
    fn test_align_pads_to_boundary() {
        let mut buf = vec![0xAA; 6];
        FieldValue::Align(4).pack(&mut buf);
        assert_eq!(buf.len(), 8);
        assert_eq!(&buf[6..], &[0, 0]);
    }

    #[test]
    fn test_align_is_noop_when_already_aligned() {
        let mut buf = vec![0xAA; 8];
        FieldValue::Align(4).pack(&mut buf);
        assert_eq!(buf.len(), 8);

        let mut empty = Vec::new();
        FieldValue::Align(512).pack(&mut empty);
        assert!(empty.is_empty());
    }
}

//! The cpio "new ASCII" (newc) on-disk format.
//!
//! Every entry is a fixed 110-byte header (6-byte magic plus thirteen
//! 8-digit uppercase hex fields), the NUL-terminated path name, a pad to a
//! 4-byte boundary, then any trailing content (file data or symlink target)
//! with its own 4-byte pad. The archive ends with a `TRAILER!!!` sentinel
//! entry padded out to a 512-byte block.
//!
//! - [`field`] - the four atomic wire field types
//! - [`entry`] - the shared header schema and the entry variants

pub mod entry;
pub mod field;

/// Magic prefix of every newc header. The `070702` (crc) variant is not
/// produced; with this magic the `check` field is left unvalidated.
pub const MAGIC: &[u8; 6] = b"070701";

/// Name of the end-of-archive sentinel entry.
pub const TRAILER_NAME: &str = "TRAILER!!!";

/// Fixed header length: magic plus thirteen 8-digit hex fields.
pub const HEADER_LEN: usize = 110;

/// Block boundary the trailer pads the archive out to.
pub const BLOCK_ALIGN: usize = 512;

//! In-memory archive builder.
//!
//! Entries accumulate in push order; [`Archive::pack`] serializes them all
//! into one buffer and always closes it with a fresh trailer entry. The whole
//! archive is materialized in memory before anything is written out.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::newc::entry::Entry;

/// First inode number handed out by a fresh allocator.
pub const FIRST_INO: u32 = 721;

/// Monotonically increasing inode numbers for archived entries.
///
/// Source-filesystem inode numbers are never reused; archives get their own
/// dense, reproducible numbering instead. Each allocator hands out every
/// number at most once.
#[derive(Debug, Clone)]
pub struct InodeAllocator {
    next: u32,
}

impl InodeAllocator {
    pub fn new(first: u32) -> Self {
        Self { next: first }
    }

    pub fn allocate(&mut self) -> u32 {
        let ino = self.next;
        self.next += 1;
        ino
    }
}

impl Default for InodeAllocator {
    fn default() -> Self {
        Self::new(FIRST_INO)
    }
}

/// An ordered collection of entries plus the final pack step.
#[derive(Debug, Default)]
pub struct Archive {
    entries: Vec<Entry>,
    inodes: InodeAllocator,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// An archive numbering inodes from a caller-supplied allocator.
    pub fn with_allocator(inodes: InodeAllocator) -> Self {
        Self {
            entries: Vec::new(),
            inodes,
        }
    }

    /// Append one entry.
    ///
    /// The entry's inode is stamped from the archive's allocator unless it
    /// was set explicitly beforehand. No deduplication: duplicate names and
    /// inodes pass through untouched.
    pub fn push(&mut self, mut entry: Entry) {
        entry.assign_ino_if_unset(self.inodes.allocate());
        self.entries.push(entry);
    }

    /// Overwrite the named hex field on every accumulated entry.
    ///
    /// Applies only to entries already pushed; call it after the last `push`
    /// and before `pack`. The classic use is `force("mtime", 0)` for
    /// byte-reproducible archives.
    pub fn force(&mut self, field: &str, value: u32) -> Result<()> {
        for entry in self.entries.iter_mut() {
            entry
                .set_hex(field, value)
                .with_context(|| format!("forcing field on entry '{}'", entry.name()))?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Serialize the archive: every entry in push order, then a trailer.
    ///
    /// The trailer's block pad guarantees the result is a multiple of 512
    /// bytes. Packing reads the entries without mutating them.
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for entry in &self.entries {
            entry.pack(&mut buf);
        }
        Entry::trailer().pack(&mut buf);
        buf
    }

    /// Pack the archive and write the bytes to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.pack())
            .with_context(|| format!("writing archive to '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newc::entry::EntryMeta;
    use crate::newc::{BLOCK_ALIGN, HEADER_LEN, TRAILER_NAME};

    fn meta() -> EntryMeta {
        EntryMeta {
            mode: 0o100644,
            uid: 0,
            gid: 0,
            mtime: 1_700_000_000,
        }
    }

    /// Minimal header decode for assertions: (name, mtime, filesize) per
    /// entry, trailer included.
    fn decode_headers(buf: &[u8]) -> Vec<(String, u32, u32)> {
        let hex = |buf: &[u8], off: usize| {
            let s = std::str::from_utf8(&buf[off..off + 8]).unwrap();
            u32::from_str_radix(s, 16).unwrap()
        };
        let align4 = |n: usize| (n + 3) & !3;

        let mut out = Vec::new();
        let mut off = 0;
        while off < buf.len() {
            assert_eq!(&buf[off..off + 6], b"070701");
            let mtime = hex(buf, off + 6 + 5 * 8);
            let filesize = hex(buf, off + 6 + 6 * 8);
            let namesize = hex(buf, off + 6 + 11 * 8) as usize;
            let name =
                String::from_utf8(buf[off + HEADER_LEN..off + HEADER_LEN + namesize - 1].to_vec())
                    .unwrap();
            let is_trailer = name == TRAILER_NAME;
            out.push((name, mtime, filesize));
            off = align4(off + HEADER_LEN + namesize) + align4(filesize as usize);
            if is_trailer {
                break;
            }
        }
        out
    }

    #[test]
    fn test_empty_archive_is_one_trailer_block() {
        let buf = Archive::new().pack();
        assert_eq!(buf.len(), BLOCK_ALIGN);
        let headers = decode_headers(&buf);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].0, TRAILER_NAME);
    }

    #[test]
    fn test_trailer_is_always_last_and_length_is_block_multiple() {
        let mut archive = Archive::new();
        archive.push(Entry::node("usr", &meta()));
        archive.push(Entry::regular("usr/greeting", b"hello\n".to_vec(), &meta()).unwrap());
        let buf = archive.pack();

        assert_eq!(buf.len() % BLOCK_ALIGN, 0);
        let headers = decode_headers(&buf);
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[0].0, "usr");
        assert_eq!(headers[1].0, "usr/greeting");
        assert_eq!(headers[2].0, TRAILER_NAME);
    }

    #[test]
    fn test_inodes_increase_in_push_order() {
        let mut archive = Archive::new();
        for name in ["a", "b", "c"] {
            archive.push(Entry::node(name, &meta()));
        }
        let inos: Vec<u32> = archive
            .entries()
            .iter()
            .map(|e| e.hex("ino").unwrap())
            .collect();
        assert_eq!(inos, vec![FIRST_INO, FIRST_INO + 1, FIRST_INO + 2]);
    }

    #[test]
    fn test_explicit_inode_survives_push() {
        let mut explicit = Entry::node("pinned", &meta());
        explicit.set_hex("ino", 42).unwrap();

        let mut archive = Archive::new();
        archive.push(explicit);
        archive.push(Entry::node("auto", &meta()));

        assert_eq!(archive.entries()[0].hex("ino"), Some(42));
        // The allocator still advances independently of the override.
        assert_eq!(archive.entries()[1].hex("ino"), Some(FIRST_INO + 1));
    }

    #[test]
    fn test_force_mtime_zeroes_every_header() {
        let mut archive = Archive::new();
        archive.push(Entry::node("etc", &meta()));
        archive.push(Entry::regular("etc/hostname", b"box\n".to_vec(), &meta()).unwrap());
        archive.force("mtime", 0).unwrap();

        for (_, mtime, _) in decode_headers(&archive.pack()) {
            assert_eq!(mtime, 0);
        }
    }

    #[test]
    fn test_force_unknown_field_fails() {
        let mut archive = Archive::new();
        archive.push(Entry::node("etc", &meta()));
        assert!(archive.force("mtlme", 0).is_err());
    }

    #[test]
    fn test_pack_does_not_mutate() {
        let mut archive = Archive::new();
        archive.push(Entry::regular("f", b"data".to_vec(), &meta()).unwrap());
        assert_eq!(archive.pack(), archive.pack());
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_write_to() {
        let temp = tempfile::TempDir::new().unwrap();
        let out = temp.path().join("test.cpio");

        let mut archive = Archive::new();
        archive.push(Entry::node("dir", &meta()));
        archive.write_to(&out).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(bytes, archive.pack());
    }
}

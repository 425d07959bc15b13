//! Archive entries: the shared header schema plus per-kind trailing fields.
//!
//! Every entry carries the same ordered base header (magic through the
//! post-name alignment pad); variants append their own trailing fields
//! (file data, symlink target, the trailer's block pad). The field list is
//! built once at construction and its order is the wire order — packing
//! never sorts, filters, or reorders.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::newc::field::{FieldValue, HeaderField};
use crate::newc::{BLOCK_ALIGN, MAGIC, TRAILER_NAME};

/// Which kind of filesystem object an entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Regular file with inline data.
    Regular,
    /// Symbolic link; the target travels in the data slot.
    Symlink,
    /// Character or block device node.
    Device,
    /// Header-only entry: directory, FIFO, or socket.
    Node,
    /// The `TRAILER!!!` end-of-archive sentinel.
    Trailer,
}

/// Metadata an entry is stamped with, independent of where it came from
/// (explicit values or a live `lstat`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryMeta {
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub mtime: u32,
}

/// One archive entry: a kind tag plus its ordered field list.
///
/// Entries own their field storage outright; constructing two entries from
/// the same inputs never aliases state between them. Packing is a pure read
/// of the current field values.
#[derive(Debug, Clone)]
pub struct Entry {
    kind: EntryKind,
    fields: Vec<HeaderField>,
}

impl Entry {
    /// A regular file carrying `data` inline.
    ///
    /// `filesize` is the exact data length; the data region is padded to a
    /// 4-byte boundary after packing. Fails if the data cannot be described
    /// by the format's 32-bit size field.
    pub fn regular(path: &str, data: Vec<u8>, meta: &EntryMeta) -> Result<Self> {
        let filesize = u32::try_from(data.len())
            .map_err(|_| anyhow::anyhow!("file data for '{path}' too large for newc (>4 GiB)"))?;
        let mut fields = base_fields(path, meta, filesize, 0, 0);
        fields.push(HeaderField::blob("data", data));
        fields.push(HeaderField::align("data_pad", 4));
        Ok(Self {
            kind: EntryKind::Regular,
            fields,
        })
    }

    /// A symbolic link pointing at `target`.
    ///
    /// The target is stored NUL-terminated in the data slot, so
    /// `filesize = target.len() + 1`.
    pub fn symlink(path: &str, target: &str, meta: &EntryMeta) -> Result<Self> {
        let filesize = u32::try_from(target.len() + 1)
            .map_err(|_| anyhow::anyhow!("symlink target for '{path}' too long for newc"))?;
        let mut fields = base_fields(path, meta, filesize, 0, 0);
        fields.push(HeaderField::name("target", target.to_string()));
        fields.push(HeaderField::align("target_pad", 4));
        Ok(Self {
            kind: EntryKind::Symlink,
            fields,
        })
    }

    /// A character or block device node.
    pub fn device(path: &str, rdevmajor: u32, rdevminor: u32, meta: &EntryMeta) -> Self {
        Self {
            kind: EntryKind::Device,
            fields: base_fields(path, meta, 0, rdevmajor, rdevminor),
        }
    }

    /// A header-only entry: directory, FIFO, or socket.
    pub fn node(path: &str, meta: &EntryMeta) -> Self {
        Self {
            kind: EntryKind::Node,
            fields: base_fields(path, meta, 0, 0, 0),
        }
    }

    /// The end-of-archive sentinel.
    ///
    /// Inode and archiver device fields are zeroed, and the entry closes
    /// with a pad to a 512-byte block boundary.
    pub fn trailer() -> Self {
        let mut fields = base_fields(TRAILER_NAME, &EntryMeta::default(), 0, 0, 0);
        set_hex_value(&mut fields, "ino", 0);
        set_hex_value(&mut fields, "devmajor", 0);
        set_hex_value(&mut fields, "devminor", 0);
        fields.push(HeaderField::align("block_pad", BLOCK_ALIGN));
        Self {
            kind: EntryKind::Trailer,
            fields,
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// The archived path, with any leading separators already stripped.
    pub fn name(&self) -> &str {
        self.fields
            .iter()
            .find_map(|f| match (f.name, &f.value) {
                ("name", FieldValue::Name(s)) => Some(s.as_str()),
                _ => None,
            })
            .unwrap_or("")
    }

    /// Look up a field's current value by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// The resolved value of a hex field (explicit value or schema default).
    pub fn hex(&self, name: &str) -> Option<u32> {
        match self.get(name)? {
            FieldValue::Hex { value, default } => Some(value.unwrap_or(*default)),
            _ => None,
        }
    }

    /// Whether a hex field has an explicitly set value (vs. its default).
    pub fn hex_is_set(&self, name: &str) -> bool {
        matches!(
            self.get(name),
            Some(FieldValue::Hex { value: Some(_), .. })
        )
    }

    /// Overwrite a hex field by name.
    ///
    /// Fails on unknown field names and on fields of a different kind, so a
    /// typo in a bulk override surfaces instead of silently doing nothing.
    pub fn set_hex(&mut self, name: &str, value: u32) -> Result<()> {
        for field in self.fields.iter_mut() {
            if field.name == name {
                match &mut field.value {
                    FieldValue::Hex { value: v, .. } => {
                        *v = Some(value);
                        return Ok(());
                    }
                    _ => bail!("header field '{name}' is not a hex field"),
                }
            }
        }
        bail!("unknown header field '{name}'")
    }

    /// Assign an inode number unless one was set explicitly.
    pub(crate) fn assign_ino_if_unset(&mut self, ino: u32) {
        if !self.hex_is_set("ino") {
            set_hex_value(&mut self.fields, "ino", ino);
        }
    }

    /// Append this entry's wire representation to `buf`, field by field in
    /// schema order. Never mutates the entry.
    pub fn pack(&self, buf: &mut Vec<u8>) {
        for field in &self.fields {
            field.value.pack(buf);
        }
    }
}

/// The shared base header, in wire order.
///
/// The alignment pad sits immediately after the name it pads; variant extras
/// are appended after it by the constructors above.
fn base_fields(
    path: &str,
    meta: &EntryMeta,
    filesize: u32,
    rdevmajor: u32,
    rdevminor: u32,
) -> Vec<HeaderField> {
    let name = path.trim_start_matches('/').to_string();
    let namesize = name.len() as u32 + 1;
    vec![
        HeaderField::blob("magic", MAGIC.to_vec()),
        HeaderField::hex("ino", 0),
        HeaderField::hex_set("mode", meta.mode),
        HeaderField::hex_set("uid", meta.uid),
        HeaderField::hex_set("gid", meta.gid),
        HeaderField::hex("nlink", 1),
        HeaderField::hex_set("mtime", meta.mtime),
        HeaderField::hex_set("filesize", filesize),
        HeaderField::hex("devmajor", 3),
        HeaderField::hex("devminor", 1),
        HeaderField::hex_set("rdevmajor", rdevmajor),
        HeaderField::hex_set("rdevminor", rdevminor),
        HeaderField::hex_set("namesize", namesize),
        HeaderField::hex("check", 0),
        HeaderField::name("name", name),
        HeaderField::align("name_pad", 4),
    ]
}

fn set_hex_value(fields: &mut [HeaderField], name: &str, value: u32) {
    for field in fields.iter_mut() {
        if field.name == name {
            if let FieldValue::Hex { value: v, .. } = &mut field.value {
                *v = Some(value);
            }
            return;
        }
    }
}

//! Archive manifests: a JSON summary of what was packed.
//!
//! Mirrors the archive's contents (one record per entry) plus the sha256 of
//! the packed bytes, so downstream builds can verify an archive without
//! re-reading it and diff two builds without a byte comparison.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use crate::archive::Archive;
use crate::newc::entry::EntryKind;

/// One archived entry as recorded in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Raw `st_mode` bits, type included.
    pub mode: u32,
    /// Bytes of trailing content (file data, or symlink target + NUL).
    pub size: u32,
}

/// Summary of a packed archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveManifest {
    /// Hex sha256 of the complete archive byte stream, trailer included.
    pub sha256: String,
    /// Total archive length; always a multiple of 512.
    pub size_bytes: u64,
    /// Entries in archive order. The trailer is implicit and not listed.
    pub entries: Vec<ManifestEntry>,
}

impl ArchiveManifest {
    /// Describe `archive` given its already-packed bytes.
    ///
    /// Taking the bytes avoids packing twice when the caller also writes
    /// the archive out.
    pub fn new(archive: &Archive, packed: &[u8]) -> Self {
        let entries = archive
            .entries()
            .iter()
            .map(|e| ManifestEntry {
                name: e.name().to_string(),
                kind: e.kind(),
                mode: e.hex("mode").unwrap_or(0),
                size: e.hex("filesize").unwrap_or(0),
            })
            .collect();
        Self {
            sha256: sha256_hex(packed),
            size_bytes: packed.len() as u64,
            entries,
        }
    }

    /// Pack `archive` and describe the result.
    pub fn from_archive(archive: &Archive) -> Self {
        Self::new(archive, &archive.pack())
    }

    /// Write the manifest as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing archive manifest")?;
        fs::write(path, json)
            .with_context(|| format!("writing manifest to '{}'", path.display()))
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

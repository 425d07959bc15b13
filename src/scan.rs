//! Filesystem capture: turn paths under a root into archive entries.
//!
//! Classification of an `lstat` result into an entry variant:
//!
//! | reported type       | variant | extras |
//! |---------------------|---------|--------|
//! | char/block device   | device  | rdevmajor/rdevminor from `st_rdev` |
//! | symbolic link       | symlink | target, `filesize = len + 1` |
//! | regular file        | regular | file content, `filesize = len` |
//! | anything else       | node    | none |
//!
//! Any unreadable path (metadata, content, or link target) aborts the scan
//! with an error naming it; there are no partial or best-effort archives.
//! Paths must be valid UTF-8, since the header's name field is textual.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use walkdir::WalkDir;

use crate::archive::Archive;
use crate::newc::entry::{Entry, EntryMeta};

const S_IFMT: u32 = libc::S_IFMT as u32;
const S_IFCHR: u32 = libc::S_IFCHR as u32;
const S_IFBLK: u32 = libc::S_IFBLK as u32;
const S_IFLNK: u32 = libc::S_IFLNK as u32;
const S_IFREG: u32 = libc::S_IFREG as u32;

/// Overrides applied while capturing metadata.
///
/// Fixed values replace what `lstat` reports, the usual reason being
/// byte-reproducible archives that should not leak build-host identities or
/// timestamps. A fixed mtime also sidesteps the 2106 range check.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Use this mtime for every entry instead of the filesystem's.
    pub fixed_mtime: Option<u32>,

    /// Use this owner uid for every entry instead of the filesystem's.
    pub fixed_uid: Option<u32>,

    /// Use this owner gid for every entry instead of the filesystem's.
    pub fixed_gid: Option<u32>,
}

/// Build one entry for `rel` under `root` by inspecting the filesystem.
///
/// `rel` becomes the archived name. The path is `lstat`ed, never followed,
/// so symlinks are archived as links rather than their targets.
pub fn entry_for_path(root: &Path, rel: &Path, options: &ScanOptions) -> Result<Entry> {
    let fpath = root.join(rel);
    let md = fs::symlink_metadata(&fpath)
        .with_context(|| format!("reading metadata for '{}'", fpath.display()))?;
    let name = rel
        .to_str()
        .ok_or_else(|| anyhow!("non-UTF-8 path name '{}'", rel.display()))?;
    let meta = capture_meta(&md, &fpath, options)?;

    match md.mode() & S_IFMT {
        S_IFCHR | S_IFBLK => {
            let (major, minor) = split_rdev(md.rdev());
            Ok(Entry::device(name, major, minor, &meta))
        }
        S_IFLNK => {
            let target = fs::read_link(&fpath)
                .with_context(|| format!("reading symlink target of '{}'", fpath.display()))?;
            let target = target
                .to_str()
                .ok_or_else(|| anyhow!("non-UTF-8 symlink target of '{}'", fpath.display()))?
                .to_string();
            Entry::symlink(name, &target, &meta)
        }
        S_IFREG => {
            let data = fs::read(&fpath)
                .with_context(|| format!("reading file content of '{}'", fpath.display()))?;
            Entry::regular(name, data, &meta)
        }
        _ => Ok(Entry::node(name, &meta)),
    }
}

/// Walk the subtree under `root` and push one entry per discovered path.
///
/// Depth-first, directories before their contents, siblings sorted by file
/// name so the same tree always produces the same archive. The root itself
/// is not archived; entry names are relative to it.
pub fn scan_tree(root: &Path, archive: &mut Archive, options: &ScanOptions) -> Result<()> {
    for dirent in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let dirent =
            dirent.with_context(|| format!("walking directory tree under '{}'", root.display()))?;
        let rel = dirent.path().strip_prefix(root).with_context(|| {
            format!(
                "relativizing '{}' against '{}'",
                dirent.path().display(),
                root.display()
            )
        })?;
        archive.push(entry_for_path(root, rel, options)?);
    }
    Ok(())
}

fn capture_meta(md: &fs::Metadata, path: &Path, options: &ScanOptions) -> Result<EntryMeta> {
    let mtime = match options.fixed_mtime {
        Some(t) => t,
        None => u32::try_from(md.mtime()).map_err(|_| {
            anyhow!(
                "mtime of '{}' out of newc range (before 1970 or after 2106)",
                path.display()
            )
        })?,
    };
    Ok(EntryMeta {
        mode: md.mode(),
        uid: options.fixed_uid.unwrap_or(md.uid()),
        gid: options.fixed_gid.unwrap_or(md.gid()),
        mtime,
    })
}

/// Split a raw `st_rdev` into the 16-bit major/minor pair newc carries.
fn split_rdev(rdev: u64) -> (u32, u32) {
    (((rdev >> 16) & 0xFFFF) as u32, (rdev & 0xFFFF) as u32)
}

//! Build cpio archives in the "new ASCII" (`070701` / newc) format, the
//! variant the Linux kernel accepts for initramfs images.
//!
//! The archive is assembled fully in memory: entries are constructed either
//! from explicit attributes or from a live filesystem scan, accumulate in an
//! [`Archive`], and one final `pack` serializes headers, names, file data,
//! alignment pads, and the closing `TRAILER!!!` block into a single byte
//! buffer any standard cpio consumer can read.
//!
//! - **[`newc`]** - the on-disk format: atomic field codecs and the shared
//!   header schema each entry variant extends
//! - **[`archive`]** - the ordered builder: `push`, bulk `force` overrides,
//!   `pack`, and deterministic inode numbering
//! - **[`scan`]** - filesystem capture: classify `lstat` results into entry
//!   variants and walk whole subtrees
//! - **[`manifest`]** - JSON summaries of packed archives (entry list plus
//!   sha256)
//!
//! # Example
//!
//! ```rust,ignore
//! use cpio_builder::{scan_tree, Archive, ScanOptions};
//! use std::path::Path;
//!
//! let mut archive = Archive::new();
//! scan_tree(Path::new("initramfs-root"), &mut archive, &ScanOptions::default())?;
//! archive.force("mtime", 0)?; // byte-reproducible output
//! archive.write_to(Path::new("initramfs.cpio"))?;
//! ```
//!
//! Reading existing archives, the old binary and "odc" variants,
//! compression, and multi-volume output are out of scope.

pub mod archive;
pub mod manifest;
pub mod newc;
pub mod scan;

pub use archive::{Archive, InodeAllocator};
pub use manifest::ArchiveManifest;
pub use newc::entry::{Entry, EntryKind, EntryMeta};
pub use scan::{entry_for_path, scan_tree, ScanOptions};

use std::path::Path;

use anyhow::{bail, Context, Result};
use cpio_builder::{scan_tree, Archive, ArchiveManifest, ScanOptions};

fn usage() -> &'static str {
    "Usage:\n  mkcpio build <source_dir> <output.cpio> [--zero-mtime]\n  mkcpio manifest <source_dir> <output.cpio> <manifest.json> [--zero-mtime]"
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.as_slice() {
        [build, source, output] if build == "build" => {
            build_archive(Path::new(source), Path::new(output), None, false)
        }
        [build, source, output, flag] if build == "build" && flag == "--zero-mtime" => {
            build_archive(Path::new(source), Path::new(output), None, true)
        }
        [manifest, source, output, manifest_path] if manifest == "manifest" => build_archive(
            Path::new(source),
            Path::new(output),
            Some(Path::new(manifest_path)),
            false,
        ),
        [manifest, source, output, manifest_path, flag]
            if manifest == "manifest" && flag == "--zero-mtime" =>
        {
            build_archive(
                Path::new(source),
                Path::new(output),
                Some(Path::new(manifest_path)),
                true,
            )
        }
        _ => bail!(usage()),
    }
}

fn build_archive(
    source: &Path,
    output: &Path,
    manifest_path: Option<&Path>,
    zero_mtime: bool,
) -> Result<()> {
    if !source.is_dir() {
        bail!("source '{}' is not a directory", source.display());
    }

    let mut archive = Archive::new();
    scan_tree(source, &mut archive, &ScanOptions::default())
        .with_context(|| format!("scanning '{}'", source.display()))?;
    println!("[mkcpio] captured {} entries from {}", archive.len(), source.display());

    if zero_mtime {
        archive
            .force("mtime", 0)
            .context("zeroing mtimes for reproducible output")?;
    }

    let packed = archive.pack();
    std::fs::write(output, &packed)
        .with_context(|| format!("writing archive to '{}'", output.display()))?;
    println!("[mkcpio] wrote {} bytes to {}", packed.len(), output.display());

    if let Some(path) = manifest_path {
        let manifest = ArchiveManifest::new(&archive, &packed);
        manifest.write_to(path)?;
        println!("[mkcpio] manifest ({}) at {}", manifest.sha256, path.display());
    }

    Ok(())
}

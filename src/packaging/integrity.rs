//! `DEBIAN/md5sums` generation.

use crate::error::{ErrorExt, Result, join_error};
use std::{
    fs::File,
    io::{self, Write},
    path::Path,
};
use walkdir::WalkDir;

/// Metadata directory excluded from the integrity manifest.
pub const METADATA_DIR: &str = "DEBIAN";

/// Checksum every regular file under `staging`, skipping the metadata
/// directory, and write `<md5>  /<relative-path>` lines to `manifest`.
///
/// Returns the number of entries written.
pub async fn write_md5sums(staging: &Path, manifest: &Path) -> Result<usize> {
    let staging = staging.to_path_buf();
    let manifest = manifest.to_path_buf();
    tokio::task::spawn_blocking(move || md5sums_blocking(&staging, &manifest))
        .await
        .map_err(|e| join_error("md5sums generation", e))?
}

fn md5sums_blocking(staging: &Path, manifest: &Path) -> Result<usize> {
    if let Some(parent) = manifest.parent() {
        std::fs::create_dir_all(parent).fs_context("creating md5sums directory", parent)?;
    }
    let mut out = File::create(manifest).fs_context("creating md5sums file", manifest)?;

    let mut count = 0;
    let walker = WalkDir::new(staging)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() != 1 || e.file_name() != METADATA_DIR);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let mut src = File::open(entry.path()).fs_context("opening file for MD5", entry.path())?;
        let mut context = md5::Context::new();
        io::copy(&mut src, &mut context).fs_context("hashing file", entry.path())?;
        let digest = context.finalize();

        let rel_path = entry.path().strip_prefix(staging)?;
        let rel = rel_path.to_string_lossy().replace('\\', "/");
        writeln!(out, "{:x}  /{}", digest, rel).fs_context("writing md5sums file", manifest)?;
        count += 1;
    }

    out.flush().fs_context("writing md5sums file", manifest)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_staged_files_but_not_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let staging = tmp.path().join("tmpdeb");
        std::fs::create_dir_all(staging.join("usr/share/rustdesk")).unwrap();
        std::fs::create_dir_all(staging.join("DEBIAN")).unwrap();
        std::fs::write(staging.join("usr/share/rustdesk/rustdesk"), b"hello").unwrap();
        std::fs::write(staging.join("DEBIAN/control"), b"Package: x\n").unwrap();

        let manifest = staging.join("DEBIAN/md5sums");
        let count = write_md5sums(&staging, &manifest).await.unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            std::fs::read_to_string(&manifest).unwrap(),
            "5d41402abc4b2a76b9719d911017c592  /usr/share/rustdesk/rustdesk\n"
        );
    }
}

//! Filtered ZIP extraction.

use super::filter::EntryFilter;
use crate::error::{ErrorExt, ReleaseError, Result, archive_error};
use std::path::{Path, PathBuf};

/// Extracts the entries of an in-memory ZIP archive admitted by `filter`
/// into `dest`, preserving archive-relative paths.
///
/// Entries with `..` components or absolute paths are rejected before
/// anything is written for them. Returns the paths of extracted files.
pub async fn extract_filtered(data: &[u8], dest: &Path, filter: &EntryFilter) -> Result<Vec<PathBuf>> {
    use async_zip::base::read::mem::ZipFileReader;
    use futures_lite::io::AsyncReadExt as _;

    let reader = ZipFileReader::new(data.to_vec())
        .await
        .map_err(|e| archive_error("reading ZIP archive", e))?;

    let mut extracted = Vec::new();
    for i in 0..reader.file().entries().len() {
        let entry = reader
            .file()
            .entries()
            .get(i)
            .ok_or_else(|| ReleaseError::Archive(format!("missing ZIP entry {}", i)))?;

        let filename = entry
            .filename()
            .as_str()
            .map_err(|e| archive_error("invalid filename in ZIP", e))?
            .to_string();

        if !filter.admits(&filename) {
            log::debug!("skip entry {}", filename);
            continue;
        }

        if filename.split(['/', '\\']).any(|c| c == "..")
            || filename.starts_with('/')
            || filename.starts_with('\\')
        {
            return Err(ReleaseError::Archive(format!(
                "refusing to extract entry outside the destination: {}",
                filename
            )));
        }

        let is_dir = entry
            .dir()
            .map_err(|e| archive_error("inspecting ZIP entry", e))?;
        let target = dest.join(&filename);

        if is_dir {
            tokio::fs::create_dir_all(&target)
                .await
                .fs_context("creating directory", &target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .fs_context("creating directory", parent)?;
        }

        let mut entry_reader = reader
            .reader_with_entry(i)
            .await
            .map_err(|e| archive_error("reading ZIP entry", e))?;
        let mut content = Vec::new();
        entry_reader.read_to_end(&mut content).await?;

        log::info!("extract file {}", filename);
        tokio::fs::write(&target, content)
            .await
            .fs_context("writing extracted file", &target)?;
        extracted.push(target);
    }

    Ok(extracted)
}

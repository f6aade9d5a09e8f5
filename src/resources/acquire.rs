//! Staging directory lifecycle and per-bundle acquisition.

use super::{
    checksum::ChecksumManifest, extract::extract_filtered, fetch::Fetcher, filter::EntryFilter,
};
use crate::error::{ErrorExt, ReleaseError, Result};
use crate::features::{ResolvedFeatureSet, ResourceBundleDescriptor};
use std::path::{Path, PathBuf};

/// Result of an acquisition pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquiredResources {
    /// Features whose bundles were extracted
    pub bundles: Vec<String>,
    /// Extracted files, in extraction order
    pub files: Vec<PathBuf>,
}

impl AcquiredResources {
    /// Whether nothing was acquired.
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

/// Recreate the staging directory.
///
/// A real directory is removed and recreated. A symlink to a directory is
/// reused as-is. Any other existing entry is a [`ReleaseError::ConflictingPath`].
pub async fn prepare_staging(path: &Path) -> Result<()> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => {
            log::debug!("Clearing staging directory {}", path.display());
            tokio::fs::remove_dir_all(path)
                .await
                .fs_context("removing staging directory", path)?;
        }
        Ok(meta) if meta.file_type().is_symlink() && path.is_dir() => {
            log::debug!("Reusing symlinked staging directory {}", path.display());
            return Ok(());
        }
        Ok(_) => {
            return Err(ReleaseError::ConflictingPath {
                path: path.to_path_buf(),
                reason: "exists and is not a directory".to_string(),
            });
        }
        Err(_) => {}
    }
    tokio::fs::create_dir_all(path)
        .await
        .fs_context("creating staging directory", path)
}

/// Downloads, verifies and extracts resource bundles.
#[derive(Debug)]
pub struct ResourceAcquirer<'a, F> {
    fetcher: &'a F,
}

impl<'a, F: Fetcher> ResourceAcquirer<'a, F> {
    /// Acquirer using `fetcher` for every download.
    pub fn new(fetcher: &'a F) -> Self {
        Self { fetcher }
    }

    /// Populate `staging` with the bundles of `features`.
    ///
    /// Does nothing, not even touching `staging`, when no feature declares a
    /// bundle. Archives are downloaded next to the staging directory and
    /// deleted once extracted.
    pub async fn acquire(
        &self,
        features: &ResolvedFeatureSet,
        staging: &Path,
    ) -> Result<AcquiredResources> {
        let bundles: Vec<_> = features.bundles().collect();
        if bundles.is_empty() {
            return Ok(AcquiredResources::default());
        }

        log::info!(
            "Build with features {:?}",
            bundles.iter().map(|(name, _)| *name).collect::<Vec<_>>()
        );
        prepare_staging(staging).await?;

        let download_dir = staging
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut acquired = AcquiredResources::default();
        for (name, bundle) in bundles {
            log::info!("{} download begin", name);
            let files = self
                .acquire_bundle(bundle, staging, download_dir)
                .await?;
            log::info!("{} extract end", name);
            acquired.bundles.push(name.to_string());
            acquired.files.extend(files);
        }
        Ok(acquired)
    }

    async fn acquire_bundle(
        &self,
        bundle: &ResourceBundleDescriptor,
        staging: &Path,
        download_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let filter = EntryFilter::compile(bundle)?;
        let file_name = archive_file_name(&bundle.zip_url)?;

        let manifest_bytes = self.fetcher.fetch(&bundle.checksum_url).await?;
        let manifest = ChecksumManifest::parse(&String::from_utf8_lossy(&manifest_bytes));
        let checksum = manifest.checksum_for(&file_name, &bundle.checksum_url)?;

        let data = self.fetcher.fetch(&bundle.zip_url).await?;
        let archive_path = download_dir.join(&file_name);
        tokio::fs::write(&archive_path, &data)
            .await
            .fs_context("writing downloaded archive", &archive_path)?;

        if let Err(e) = checksum.verify(&file_name, &data) {
            tokio::fs::remove_file(&archive_path)
                .await
                .fs_context("discarding corrupt archive", &archive_path)?;
            return Err(e);
        }

        let files = extract_filtered(&data, staging, &filter).await?;

        tokio::fs::remove_file(&archive_path)
            .await
            .fs_context("removing downloaded archive", &archive_path)?;
        Ok(files)
    }
}

/// File name of the archive: the last path segment of its URL.
fn archive_file_name(zip_url: &str) -> Result<String> {
    let name = match url::Url::parse(zip_url) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string)),
        Err(_) => zip_url.rsplit('/').next().map(str::to_string),
    };
    name.filter(|n| !n.is_empty()).ok_or_else(|| {
        ReleaseError::invalid_config(format!("cannot derive archive name from {:?}", zip_url))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OsFamily;
    use crate::features::{BuildMode, FeatureCatalog, FeatureDef, FeatureRequest, resolve};
    use crate::resources::StaticFetcher;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    const ZIP_URL: &str = "https://dl.example.com/v1/bundle.zip";
    const SUMS_URL: &str = "https://dl.example.com/v1/checksums";

    fn archive() -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in [("data/public/y", "y"), ("data/secret/x", "x"), ("other/z", "z")] {
            writer.start_file(name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn features() -> ResolvedFeatureSet {
        let mut catalog = FeatureCatalog::builtin();
        catalog.insert(FeatureDef {
            name: "Bundle".into(),
            platforms: vec![OsFamily::Linux],
            bundle: Some(ResourceBundleDescriptor {
                zip_url: ZIP_URL.into(),
                checksum_url: SUMS_URL.into(),
                include: vec!["^data/.*".into()],
                exclude: vec!["^data/secret.*".into()],
            }),
            cargo: false,
        });
        let request = FeatureRequest::List(vec!["Bundle".into()]);
        resolve(&catalog, &request, OsFamily::Linux, BuildMode::Inline).features
    }

    #[tokio::test]
    async fn verified_bundle_is_filtered_into_staging() {
        let tmp = tempfile::tempdir().unwrap();
        let staging = tmp.path().join("resources");
        std::fs::create_dir_all(&staging).unwrap();
        std::fs::write(staging.join("stale.txt"), "old").unwrap();

        let data = archive();
        let sums = format!("{:x}  bundle.zip\n", md5::compute(&data));
        let fetcher = StaticFetcher::new().with(SUMS_URL, sums).with(ZIP_URL, data);

        let acquired = ResourceAcquirer::new(&fetcher)
            .acquire(&features(), &staging)
            .await
            .unwrap();

        assert_eq!(acquired.bundles, vec!["Bundle"]);
        assert!(staging.join("data/public/y").exists());
        assert!(!staging.join("data/secret").exists());
        assert!(!staging.join("other").exists());
        assert!(!staging.join("stale.txt").exists());
        assert!(!tmp.path().join("bundle.zip").exists());
    }

    #[tokio::test]
    async fn checksum_mismatch_stops_before_extraction() {
        let tmp = tempfile::tempdir().unwrap();
        let staging = tmp.path().join("resources");
        let sums = "0123456789abcdef0123456789abcdef bundle.zip\n";
        let fetcher = StaticFetcher::new().with(SUMS_URL, sums).with(ZIP_URL, archive());

        let err = ResourceAcquirer::new(&fetcher)
            .acquire(&features(), &staging)
            .await
            .unwrap_err();

        assert!(matches!(err, ReleaseError::IntegrityError { .. }));
        assert!(!staging.join("data").exists());
        assert!(!tmp.path().join("bundle.zip").exists());
    }

    #[tokio::test]
    async fn regular_file_at_staging_path_conflicts_before_any_fetch() {
        let tmp = tempfile::tempdir().unwrap();
        let staging = tmp.path().join("resources");
        std::fs::write(&staging, "not a dir").unwrap();
        let fetcher = StaticFetcher::new();

        let err = ResourceAcquirer::new(&fetcher)
            .acquire(&features(), &staging)
            .await
            .unwrap_err();

        assert!(matches!(err, ReleaseError::ConflictingPath { .. }));
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn no_bundles_leaves_staging_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let staging = tmp.path().join("resources");
        std::fs::write(&staging, "a file").unwrap();
        let fetcher = StaticFetcher::new();
        let features = ResolvedFeatureSet::empty(BuildMode::Flutter);

        let acquired = ResourceAcquirer::new(&fetcher)
            .acquire(&features, &staging)
            .await
            .unwrap();
        assert!(acquired.is_empty());
        assert!(staging.is_file());
    }

    #[test]
    fn archive_name_is_last_url_segment() {
        assert_eq!(archive_file_name(ZIP_URL).unwrap(), "bundle.zip");
        assert_eq!(archive_file_name("bundle.zip").unwrap(), "bundle.zip");
        assert!(archive_file_name("https://example.com/dir/").is_err());
    }
}

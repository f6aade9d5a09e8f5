//! Staged-tree packaging: lay out, describe, checksum, pack, rename.

use super::{
    control::DebControl,
    integrity::{METADATA_DIR, write_md5sums},
    steps::{BuildStep, run_steps},
};
use crate::error::{ErrorExt, ReleaseError, Result};
use crate::tools::{Invocation, ToolRunner};
use crate::utils::fs::{move_file, remove_dir_all};
use std::{
    io,
    path::{Path, PathBuf},
};

/// How to produce one artifact from a staged tree.
#[derive(Debug, Clone)]
pub struct PackagingLayout {
    /// Short format name used in logs, e.g. `deb`
    pub format: &'static str,
    /// Tree recreated before staging and removed after success
    pub staging: Option<PathBuf>,
    /// Staging steps, run in order
    pub steps: Vec<BuildStep>,
    /// Control file written to `<staging>/DEBIAN/control`
    pub control: Option<DebControl>,
    /// Write `<staging>/DEBIAN/md5sums`
    pub integrity: bool,
    /// The native packager
    pub packager: Invocation,
    /// Where the packager may leave its output; first existing wins
    pub produced: Vec<PathBuf>,
    /// Final versioned artifact path
    pub artifact: PathBuf,
}

impl PackagingLayout {
    /// Layout with no staging tree and no staging steps.
    pub fn new(format: &'static str, packager: Invocation, produced: PathBuf, artifact: PathBuf) -> Self {
        Self {
            format,
            staging: None,
            steps: Vec::new(),
            control: None,
            integrity: false,
            packager,
            produced: vec![produced],
            artifact,
        }
    }
}

/// Runs [`PackagingLayout`]s.
#[derive(Debug)]
pub struct Assembler<'a, R> {
    runner: &'a R,
}

impl<'a, R: ToolRunner> Assembler<'a, R> {
    /// Assembler driving tools through `runner`.
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Stage, pack and rename. Returns the artifact path.
    ///
    /// On packager failure the staged tree is kept and
    /// [`ReleaseError::PackagingFailed`] is returned.
    pub async fn assemble(&self, layout: &PackagingLayout) -> Result<PathBuf> {
        log::info!("Assembling {} package {}", layout.format, layout.artifact.display());

        if let Some(staging) = &layout.staging {
            recreate_staging(staging).await?;
        }

        run_steps(&layout.steps, self.runner).await?;

        if let Some(staging) = &layout.staging {
            let metadata_dir = staging.join(METADATA_DIR);
            if let Some(control) = &layout.control {
                let control_path = metadata_dir.join("control");
                tokio::fs::create_dir_all(&metadata_dir)
                    .await
                    .fs_context("creating control directory", &metadata_dir)?;
                tokio::fs::write(&control_path, control.render())
                    .await
                    .fs_context("writing control file", &control_path)?;
            }
            if layout.integrity {
                let entries = write_md5sums(staging, &metadata_dir.join("md5sums")).await?;
                log::debug!("md5sums lists {} files", entries);
            }
        }

        let diagnostic_dir = layout
            .staging
            .clone()
            .or_else(|| layout.packager.cwd.clone())
            .unwrap_or_default();
        run_packager(self.runner, &layout.packager, &diagnostic_dir).await?;

        let produced = layout
            .produced
            .iter()
            .find(|p| p.is_file())
            .ok_or_else(|| ReleaseError::Fs {
                context: "locating packager output",
                path: layout.produced.first().cloned().unwrap_or_default(),
                error: io::Error::new(io::ErrorKind::NotFound, "packager produced no file"),
            })?;
        move_file(produced, &layout.artifact).await?;

        if let Some(staging) = &layout.staging {
            remove_dir_all(staging).await?;
        }
        log::info!("Created {}", layout.artifact.display());
        Ok(layout.artifact.clone())
    }
}

/// Run a native packager, mapping a non-zero exit to
/// [`ReleaseError::PackagingFailed`] naming `staging`.
pub(crate) async fn run_packager<R: ToolRunner>(
    runner: &R,
    packager: &Invocation,
    staging: &Path,
) -> Result<()> {
    let output = runner.run(packager).await?;
    if output.success() {
        return Ok(());
    }
    Err(ReleaseError::PackagingFailed {
        command: packager.command_line(),
        status: output.status_text(),
        staging: staging.to_path_buf(),
        output: output.combined(),
    })
}

async fn recreate_staging(staging: &Path) -> Result<()> {
    match tokio::fs::symlink_metadata(staging).await {
        Ok(meta) if meta.is_dir() => remove_dir_all(staging).await?,
        Ok(_) => {
            return Err(ReleaseError::ConflictingPath {
                path: staging.to_path_buf(),
                reason: "packaging staging path is not a directory".to_string(),
            });
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e).fs_context("inspecting staging directory", staging),
    }
    tokio::fs::create_dir_all(staging)
        .await
        .fs_context("creating staging directory", staging)
}

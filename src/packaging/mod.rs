//! Packaging assembler.
//!
//! Each [`PackageTarget`] maps to a staged layout handed to a native
//! packager ([`PackagingLayout`] + [`Assembler`]) or, for the Windows
//! executables, to the portable packer sequence in [`windows`].

mod artifact;
mod assembler;
mod control;
pub mod debian;
pub mod dmg;
mod integrity;
pub mod pacman;
mod paths;
pub mod rpm;
mod steps;
mod target;
pub mod windows;

pub use artifact::ArtifactName;
pub use assembler::{Assembler, PackagingLayout};
pub use control::DebControl;
pub use integrity::{METADATA_DIR, write_md5sums};
pub use paths::{ProjectPaths, STAGING_DIR};
pub use steps::{BuildStep, run_steps};
pub use target::{PackageTarget, RpmFlavor};

use crate::branding::BrandingPatcher;
use crate::config::{EnvOverrides, ReleaseSettings};
use crate::error::Result;
use crate::tools::{MacSigner, Notice, ToolRunner};
use std::path::{Path, PathBuf};

/// Inputs shared by every packaging path.
#[derive(Debug, Clone, Copy)]
pub struct PackageContext<'a> {
    /// Project locations
    pub paths: &'a ProjectPaths,
    /// Product identity and package metadata
    pub settings: &'a ReleaseSettings,
    /// Environment overrides (architecture, signing, home)
    pub env: &'a EnvOverrides,
    /// Full version stamped into names and metadata
    pub version: &'a str,
    /// GUI (flutter) build
    pub gui: bool,
    /// Stop the Windows GUI path before the portable packer
    pub skip_portable_pack: bool,
    /// Prebuilt application folder for [`PackageTarget::DebFromFolder`]
    pub package_from: Option<&'a Path>,
}

impl<'a> PackageContext<'a> {
    /// Context for a legacy (non-GUI) build.
    pub fn new(
        paths: &'a ProjectPaths,
        settings: &'a ReleaseSettings,
        env: &'a EnvOverrides,
        version: &'a str,
    ) -> Self {
        Self {
            paths,
            settings,
            env,
            version,
            gui: false,
            skip_portable_pack: false,
            package_from: None,
        }
    }

    /// Set GUI mode.
    pub fn gui(mut self, gui: bool) -> Self {
        self.gui = gui;
        self
    }

    /// Set whether the portable pack is skipped.
    pub fn skip_portable_pack(mut self, skip: bool) -> Self {
        self.skip_portable_pack = skip;
        self
    }

    /// Package a prebuilt folder.
    pub fn package_from(mut self, folder: Option<&'a Path>) -> Self {
        self.package_from = folder;
        self
    }
}

/// Artifacts and best-effort notices from one packaging path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembled {
    /// Produced files, in creation order
    pub artifacts: Vec<PathBuf>,
    /// Outcomes of best-effort steps
    pub notices: Vec<Notice>,
}

/// Produce the artifact(s) for `target`.
pub async fn assemble_target<R: ToolRunner>(
    target: PackageTarget,
    ctx: &PackageContext<'_>,
    runner: &R,
    patcher: &BrandingPatcher,
) -> Result<Assembled> {
    let assembler = Assembler::new(runner);
    let layout = match target {
        PackageTarget::WindowsPortable => return windows::portable(ctx, runner, patcher).await,
        PackageTarget::WindowsInstaller => return windows::installer(ctx, runner).await,
        PackageTarget::Deb => debian::flutter_layout(ctx),
        PackageTarget::DebBundle => debian::bundle_layout(ctx),
        PackageTarget::DebFromFolder => {
            let folder = ctx.package_from.unwrap_or_else(|| Path::new("."));
            debian::folder_layout(ctx, folder)
        }
        PackageTarget::Pacman => pacman::layout(ctx),
        PackageTarget::Rpm(flavor) => rpm::layout(ctx, flavor)?,
        PackageTarget::Dmg => dmg::flutter_layout(ctx),
        PackageTarget::DmgBundle => dmg::bundle_layout(ctx, &MacSigner::from_env(ctx.env)),
    };

    let artifact = assembler.assemble(&layout).await?;
    let mut assembled = Assembled::default();
    if matches!(target, PackageTarget::Dmg | PackageTarget::DmgBundle) {
        let outcome = MacSigner::from_env(ctx.env).sign(runner, &artifact).await?;
        assembled.notices.push(Notice::new("signing disk image", outcome));
    }
    assembled.artifacts.push(artifact);
    Ok(assembled)
}

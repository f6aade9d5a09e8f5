//! Command line argument parsing.

use crate::config::{BuildConfig, FeatureToggles, Platform};
use crate::error::Result;
use crate::features::FeatureRequest;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Release builds for the desktop application
#[derive(Parser, Debug)]
#[command(
    name = "desk_release",
    version,
    about = "Build, package and sign a versioned desktop release",
    long_about = "Resolve features, fetch verified resource bundles, compile and package a
versioned installer for the host platform.

Usage:
  desk_release --flutter
  desk_release --flutter --hwcodec -f ALL
  desk_release --package prebuilt/bundle
  desk_release set-version 1.4.1 --build-number 3"
)]
pub struct Args {
    /// Subcommand; without one a release build runs
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Features to integrate; `ALL` selects every feature available on this host
    #[arg(short = 'f', long = "feature", value_name = "FEATURE", num_args = 1..)]
    pub feature: Vec<String>,

    /// Build the flutter GUI
    #[arg(long)]
    pub flutter: bool,

    /// Enable hardware codec
    #[arg(long)]
    pub hwcodec: bool,

    /// Enable the vram feature (Windows)
    #[arg(long)]
    pub vram: bool,

    /// Build a portable executable (Windows)
    #[arg(long)]
    pub portable: bool,

    /// Enable file copy and paste on Linux and macOS
    #[arg(long)]
    pub unix_file_copy_paste: bool,

    /// Enable ScreenCaptureKit capture (macOS)
    #[arg(long)]
    pub screencapturekit: bool,

    /// Reuse already-built binaries instead of running cargo
    #[arg(long)]
    pub skip_cargo: bool,

    /// Stop the Windows flutter build before the portable packer
    #[arg(long)]
    pub skip_portable_pack: bool,

    /// Package a prebuilt application folder as a deb (Linux)
    #[arg(long, value_name = "DIR")]
    pub package: Option<PathBuf>,

    /// Proxy for resource bundle downloads
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Project checkout to build
    #[arg(long, value_name = "DIR", default_value = ".", global = true)]
    pub project_dir: PathBuf,

    /// Show extra detail
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Stamp a new version into the project's manifests
    SetVersion {
        /// Semantic version, e.g. 1.4.1
        version: String,

        /// Build number for flutter/pubspec.yaml
        #[arg(long, default_value_t = 1)]
        build_number: u32,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Build configuration for `platform`. Feature tokens are validated here.
    pub fn build_config(&self, platform: Platform) -> Result<BuildConfig> {
        let mut config = BuildConfig::new(platform, self.project_dir.clone());
        config.request = FeatureRequest::parse(&self.feature)?;
        config.toggles = FeatureToggles {
            hwcodec: self.hwcodec,
            vram: self.vram,
            unix_file_copy_paste: self.unix_file_copy_paste,
            screencapturekit: self.screencapturekit,
        };
        config.gui = self.flutter;
        config.portable = self.portable;
        config.skip_compile = self.skip_cargo;
        config.skip_portable_pack = self.skip_portable_pack;
        config.package_from = self.package.clone();
        config.proxy = self.proxy.clone();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OsFamily;
    use crate::error::ReleaseError;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("desk_release").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_map_to_config() {
        let args = parse(&["--flutter", "--hwcodec", "-f", "PrivacyMode", "extra", "--skip-cargo"]);
        let config = args.build_config(Platform::new(OsFamily::Linux, None)).unwrap();
        assert!(config.gui);
        assert!(config.skip_compile);
        assert!(config.toggles.hwcodec);
        assert_eq!(
            config.request,
            FeatureRequest::List(vec!["PrivacyMode".into(), "extra".into()])
        );
    }

    #[test]
    fn bad_feature_token_is_invalid_configuration() {
        let args = parse(&["-f", "a,b"]);
        assert!(matches!(
            args.build_config(Platform::new(OsFamily::Linux, None)),
            Err(ReleaseError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn set_version_subcommand() {
        let args = parse(&["set-version", "1.4.1"]);
        assert_eq!(
            args.command,
            Some(Command::SetVersion {
                version: "1.4.1".into(),
                build_number: 1
            })
        );
    }
}

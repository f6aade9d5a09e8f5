//! # Desk Release
//!
//! Release builds for a multi-platform desktop application.
//!
//! One invocation resolves the requested feature set for the host, fetches
//! and verifies third-party resource bundles, issues a build number, patches
//! branding around the compile, and assembles the platform's native installer
//! (`.deb`, `.rpm`, pacman package, `.dmg` or Windows executables).
//!
//! ## Usage
//!
//! ```bash
//! desk_release --flutter                     # GUI build, native package
//! desk_release --flutter --hwcodec -f ALL    # every feature available here
//! desk_release --package ./bundle            # deb from a prebuilt folder
//! desk_release set-version 1.4.1             # stamp a new version
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod branding;
pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod orchestrator;
pub mod packaging;
pub mod resources;
pub mod tools;
pub mod utils;
pub mod version;

pub use cli::Args;
pub use config::{BuildConfig, EnvOverrides, OsFamily, Platform, ReleaseSettings};
pub use error::{ReleaseError, Result};
pub use features::{FeatureCatalog, FeatureRequest, ResolvedFeatureSet, resolve};
pub use orchestrator::{BuildReport, BuildState, Orchestrator};
pub use packaging::PackageTarget;
pub use resources::{Fetcher, HttpFetcher, ResourceAcquirer};
pub use tools::{ProcessRunner, ToolRunner};
pub use version::{VersionLedger, VersionRecord, VersionStamper};

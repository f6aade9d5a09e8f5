//! Run configuration: host platform, CLI-derived build configuration,
//! project settings from the manifest, and environment overrides.
//!
//! Everything here is computed once at process start and read-only afterwards.

mod build;
mod env;
mod platform;
mod settings;

pub use build::{BuildConfig, FeatureToggles};
pub use env::EnvOverrides;
pub use platform::{OsFamily, PackageManager, Platform};
pub use settings::{BrandingSettings, FeatureMetadata, ReleaseSettings};

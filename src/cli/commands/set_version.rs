//! `set-version`: stamp a version into the project manifests.

use crate::cli::{Args, OutputManager};
use crate::error::{ReleaseError, Result};
use crate::version::VersionStamper;
use semver::Version;

pub(super) fn execute_set_version(
    args: &Args,
    version: &str,
    build_number: u32,
    output: &OutputManager,
) -> Result<i32> {
    let version = Version::parse(version).map_err(|e| {
        ReleaseError::invalid_config(format!("{:?} is not a semantic version: {}", version, e))
    })?;

    output.section(&format!("Stamping version {}", version));
    let report = VersionStamper::new(&args.project_dir).stamp(&version, build_number)?;

    for path in &report.updated {
        output.success(&format!("Updated {}", path.display()));
    }
    for path in &report.skipped {
        output.verbose(&format!("Skipped {} (not present)", path.display()));
    }
    output.indent(&format!("Build date: {}", report.build_date));

    Ok(0)
}

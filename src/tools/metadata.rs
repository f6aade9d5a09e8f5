//! Windows executable resource metadata.

use super::{best_effort::BestEffort, invocation::Invocation, runner::ToolRunner};
use crate::config::ReleaseSettings;
use std::path::Path;

/// Rewrite the version-string resources of `exe` with `rcedit` (via `npx`).
///
/// Never fails the build: a missing `npx` or executable is `Skipped`, a
/// failing edit is `FailedNonFatal`.
pub async fn edit_exe_metadata<R: ToolRunner>(
    runner: &R,
    exe: &Path,
    settings: &ReleaseSettings,
) -> BestEffort {
    if !exe.is_file() {
        return BestEffort::Skipped(format!("executable not found: {}", exe.display()));
    }
    let Some(npx) = runner.locate("npx") else {
        return BestEffort::Skipped("npx not available".to_string());
    };

    log::info!("Updating metadata for {}...", exe.display());
    let invocation = Invocation::new(npx.to_string_lossy())
        .args(["-y", "rcedit"])
        .path_arg(exe)
        .args(["--set-version-string", "FileDescription"])
        .arg(settings.file_description.as_str())
        .args(["--set-version-string", "ProductName"])
        .arg(settings.product_name.as_str())
        .args(["--set-version-string", "InternalName"])
        .arg(settings.product_name.to_lowercase())
        .args(["--set-version-string", "OriginalFilename"])
        .arg(settings.product_exe());

    match runner.run(&invocation).await {
        Ok(output) if output.success() => BestEffort::Applied,
        Ok(output) => BestEffort::FailedNonFatal(format!(
            "rcedit {}: {}",
            output.status_text(),
            output.combined().trim()
        )),
        Err(e) => BestEffort::FailedNonFatal(e.to_string()),
    }
}

//! Default command: a full release build on the host platform.

use crate::cli::{Args, OutputManager};
use crate::config::{EnvOverrides, Platform, ReleaseSettings};
use crate::error::{ErrorExt, Result, StepContext};
use crate::orchestrator::{BuildReport, BuildState, Orchestrator};
use crate::resources::HttpFetcher;
use crate::tools::{BestEffort, ProcessRunner};
use crate::version::{FileCounter, VersionLedger};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

pub(super) async fn execute_build(args: &Args, output: &OutputManager) -> Result<i32> {
    let platform = Platform::detect();

    // Flag validation runs before any file is read or written.
    let config = args
        .build_config(platform)
        .in_state(BuildState::ResolveConfig)?;
    let target = config.validate().in_state(BuildState::ResolveConfig)?;

    output.section(&format!("Release build: {} on {}", target, platform.os()));

    let settings =
        ReleaseSettings::load(&config.project_dir).in_state(BuildState::ResolveConfig)?;
    let env = EnvOverrides::from_env();
    let fetcher = HttpFetcher::new(config.proxy.as_deref()).in_state(BuildState::ResolveConfig)?;
    let ledger = VersionLedger::for_project(
        FileCounter::in_project(&config.project_dir),
        &config.project_dir,
    )
    .in_state(BuildState::ResolveConfig)?;

    let mut orchestrator =
        Orchestrator::new(config, settings, env, ProcessRunner::new(), fetcher, ledger);
    let report = orchestrator.run().await?;

    print_summary(&report, output)?;
    Ok(0)
}

fn print_summary(report: &BuildReport, output: &OutputManager) -> Result<()> {
    output.section("Summary");
    output.info(&format!("Version: {}", report.version));
    output.info(&format!("Features: {}", report.features.join(",")));

    for warning in &report.warnings {
        output.warn(&warning.to_string());
    }
    if !report.resources.is_empty() {
        output.verbose(&format!(
            "Resources: {} ({} files)",
            report.resources.bundles.join(", "),
            report.resources.files.len()
        ));
    }
    for notice in &report.notices {
        match &notice.outcome {
            BestEffort::Applied => output.verbose(&format!("{}: done", notice.step)),
            BestEffort::Skipped(reason) => {
                output.verbose(&format!("{}: skipped ({})", notice.step, reason))
            }
            BestEffort::FailedNonFatal(reason) => {
                output.warn(&format!("{} failed: {}", notice.step, reason))
            }
        }
    }

    for artifact in &report.artifacts {
        let size = std::fs::metadata(artifact)
            .fs_context("reading artifact metadata", artifact)?
            .len();
        let checksum = sha256_file(artifact)?;
        output.success(&format!(
            "{} ({:.2} MB)",
            artifact.display(),
            size as f64 / 1_048_576.0
        ));
        output.indent(&format!("sha256: {}", checksum));
    }
    Ok(())
}

fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).fs_context("opening artifact", path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = file.read(&mut buffer).fs_context("reading artifact", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_known_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.bin");
        std::fs::write(&path, "hello").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}

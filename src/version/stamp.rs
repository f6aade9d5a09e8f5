//! Stamping a version into project files.
//!
//! Used by the `set-version` command and by packaging paths that carry the
//! version in a recipe (`PKGBUILD`, rpm spec).

use crate::error::{ErrorExt, ReleaseError, Result};
use chrono::{DateTime, Local};
use regex::Regex;
use semver::Version;
use std::path::{Path, PathBuf};

/// Replace the remainder of every line starting with `prefix` by `value`.
///
/// Returns `true` if any line changed. The file must exist.
pub fn replace_line_value(path: &Path, prefix: &str, value: &str) -> Result<bool> {
    let content = std::fs::read_to_string(path).fs_context("reading file to stamp", path)?;
    let pattern = Regex::new(&format!(r"(?m)^{}.*$", regex::escape(prefix)))
        .map_err(|e| ReleaseError::invalid_config(format!("bad stamp prefix {:?}: {}", prefix, e)))?;
    let replacement = format!("{}{}", prefix, value);
    let updated = pattern.replace_all(&content, regex::NoExpand(&replacement));

    if updated == content {
        return Ok(false);
    }
    std::fs::write(path, updated.as_bytes()).fs_context("writing stamped file", path)?;
    Ok(true)
}

/// Files touched by a [`VersionStamper`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StampReport {
    /// Files rewritten with the new version
    pub updated: Vec<PathBuf>,
    /// Files that do not exist in this project
    pub skipped: Vec<PathBuf>,
    /// Build date written to `src/version.rs`
    pub build_date: String,
}

/// Writes a new version into the project's version-bearing files.
#[derive(Debug, Clone)]
pub struct VersionStamper {
    root: PathBuf,
    now: DateTime<Local>,
}

impl VersionStamper {
    /// Stamper for the project at `root`, dated now.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::at(root, Local::now())
    }

    /// Stamper with a fixed build date.
    pub fn at(root: impl Into<PathBuf>, now: DateTime<Local>) -> Self {
        Self {
            root: root.into(),
            now,
        }
    }

    /// Stamp `version` (and `build_number` for pubspec) into every known file.
    pub fn stamp(&self, version: &Version, build_number: u32) -> Result<StampReport> {
        let version = version.to_string();
        let build_date = self.now.format("%Y-%m-%d %H:%M").to_string();
        let mut report = StampReport {
            build_date: build_date.clone(),
            ..Default::default()
        };

        let rs = self.root.join("src/version.rs");
        self.visit(&mut report, rs, |path| {
            let content = std::fs::read_to_string(path).fs_context("reading", path)?;
            let content = replace_quoted(&content, "VERSION: &str = ", &version);
            let content = replace_quoted(&content, "BUILD_DATE: &str = ", &build_date);
            std::fs::write(path, content).fs_context("writing", path)
        })?;

        for manifest in ["Cargo.toml", "libs/portable/Cargo.toml"] {
            let path = self.root.join(manifest);
            self.visit(&mut report, path, |path| update_package_version(path, &version))?;
        }

        let pubspec = self.root.join("flutter/pubspec.yaml");
        self.visit(&mut report, pubspec, |path| {
            replace_line_value(path, "version: ", &format!("{}+{}", version, build_number))
                .map(|_| ())
        })?;

        Ok(report)
    }

    fn visit<F>(&self, report: &mut StampReport, path: PathBuf, edit: F) -> Result<()>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        if !path.is_file() {
            log::warn!("{} not found, skipped", path.display());
            report.skipped.push(path);
            return Ok(());
        }
        edit(&path)?;
        log::info!("Stamped {}", path.display());
        report.updated.push(path);
        Ok(())
    }
}

/// Replace the string literal following `key` (e.g. `VERSION: &str = "…"`).
fn replace_quoted(content: &str, key: &str, value: &str) -> String {
    let pattern = format!(r#"{}"[^"]*""#, regex::escape(key));
    match Regex::new(&pattern) {
        Ok(re) => re
            .replace_all(content, regex::NoExpand(&format!("{}\"{}\"", key, value)))
            .into_owned(),
        Err(_) => content.to_string(),
    }
}

/// Set `[package].version` preserving formatting.
fn update_package_version(path: &Path, version: &str) -> Result<()> {
    let content = std::fs::read_to_string(path).fs_context("reading manifest", path)?;
    let mut doc = content.parse::<toml_edit::DocumentMut>()?;

    let package = doc
        .get_mut("package")
        .and_then(|p| p.as_table_like_mut())
        .ok_or_else(|| {
            ReleaseError::invalid_config(format!("{} has no [package] table", path.display()))
        })?;
    package.insert("version", toml_edit::value(version));

    std::fs::write(path, doc.to_string()).fs_context("writing manifest", path)
}

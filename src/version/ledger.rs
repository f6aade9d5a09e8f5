//! The version ledger: base version of record plus build number.

use super::counter::CounterStore;
use crate::error::{ErrorExt, ReleaseError, Result};
use std::{fmt, path::Path};

/// The version a run builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    /// Version from the manifest of record, e.g. `1.4.0`
    pub base: String,
    /// Build number issued for this run
    pub build_number: u64,
}

impl VersionRecord {
    /// `"{base}.{build_number}"`
    pub fn full_version(&self) -> String {
        format!("{}.{}", self.base, self.build_number)
    }
}

impl fmt::Display for VersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.base, self.build_number)
    }
}

/// Issues build numbers and composes full versions.
#[derive(Debug)]
pub struct VersionLedger<C> {
    store: C,
    manifest_text: String,
}

impl<C: CounterStore> VersionLedger<C> {
    /// Ledger over the manifest text of record.
    pub fn new(store: C, manifest_text: impl Into<String>) -> Self {
        Self {
            store,
            manifest_text: manifest_text.into(),
        }
    }

    /// Ledger over `<root>/Cargo.toml`.
    pub fn for_project(store: C, root: &Path) -> Result<Self> {
        let path = root.join("Cargo.toml");
        let text = std::fs::read_to_string(&path).fs_context("reading manifest", &path)?;
        Ok(Self::new(store, text))
    }

    /// Read, increment, persist and return the build counter.
    ///
    /// A missing or corrupt counter restarts the sequence at 1.
    pub fn next_build_number(&mut self) -> Result<u64> {
        let next = self.store.load().map_or(1, |n| n.saturating_add(1));
        self.store.store(next)?;
        Ok(next)
    }

    /// Version string from the first `version` key of the manifest.
    pub fn current_base_version(&self) -> Result<String> {
        read_base_version(&self.manifest_text)
    }

    /// `"{base}.{build_number}"` for an already issued build number.
    pub fn full_version(&self, build_number: u64) -> Result<String> {
        Ok(format!("{}.{}", self.current_base_version()?, build_number))
    }

    /// Issue the build number for this run. The base version is read first
    /// so a manifest without a version leaves the counter untouched.
    pub fn record_build(&mut self) -> Result<VersionRecord> {
        let base = self.current_base_version()?;
        let build_number = self.next_build_number()?;
        Ok(VersionRecord { base, build_number })
    }

    /// The underlying counter store.
    pub fn store(&self) -> &C {
        &self.store
    }
}

/// Extract the value of the first line that assigns a `version` key.
///
/// Each candidate line is parsed as TOML on its own, so trailing comments
/// and either quote style are handled.
pub fn read_base_version(manifest_text: &str) -> Result<String> {
    manifest_text
        .lines()
        .filter(|line| line.starts_with("version"))
        .filter_map(|line| toml::from_str::<toml::Table>(line).ok())
        .filter_map(|table| match table.get("version") {
            Some(toml::Value::String(value)) => Some(value.trim().to_string()),
            _ => None,
        })
        .find(|value| !value.is_empty())
        .ok_or_else(|| ReleaseError::invalid_config("manifest has no `version = \"...\"` line"))
}

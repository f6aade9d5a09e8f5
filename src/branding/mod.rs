//! Reversible branding patches.
//!
//! Identity strings in source and manifest files are rewritten before a
//! native compile and restored afterwards from a `.backup` sidecar. The
//! returned [`PatchGuard`] restores on drop, so an early return or a failed
//! compile never leaves the tree patched.
//!
//! Only one run may patch a given checkout at a time: a stale backup left by
//! an interrupted run is overwritten by the next `apply`.

mod substitutions;

pub use substitutions::{portable_manifest_substitutions, runner_rc_substitutions};

use crate::error::{ErrorExt, Result};
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};
use tokio::fs;

/// Default backup suffix.
pub const BACKUP_SUFFIX: &str = ".backup";

/// One literal replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// Literal text to find
    pub from: String,
    /// Replacement text
    pub to: String,
}

impl Substitution {
    /// Replace `from` with `to`.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Applies branding patches and hands out restore guards.
#[derive(Debug, Clone)]
pub struct BrandingPatcher {
    suffix: String,
}

impl Default for BrandingPatcher {
    fn default() -> Self {
        Self {
            suffix: BACKUP_SUFFIX.to_string(),
        }
    }
}

impl BrandingPatcher {
    /// Patcher using [`BACKUP_SUFFIX`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sidecar path holding the original content of `target`.
    pub fn backup_path(&self, target: &Path) -> PathBuf {
        let mut name = OsString::from(target.as_os_str());
        name.push(&self.suffix);
        PathBuf::from(name)
    }

    /// Back up `target`, then apply `substitutions` in order.
    ///
    /// Replacements are literal and work on the raw bytes, so files that are
    /// not UTF-8 survive a round trip unchanged. A UTF-16LE file (with BOM)
    /// is matched in UTF-16 code units. A missing target yields an empty
    /// guard.
    pub async fn apply(&self, target: &Path, substitutions: &[Substitution]) -> Result<PatchGuard> {
        if !fs::metadata(target).await.is_ok_and(|m| m.is_file()) {
            log::debug!("{} not present, branding skipped", target.display());
            return Ok(PatchGuard::empty());
        }

        let backup = self.backup_path(target);
        if fs::try_exists(&backup).await.is_ok_and(|exists| exists) {
            log::warn!(
                "Overwriting stale backup {} from an interrupted run",
                backup.display()
            );
        }
        fs::copy(target, &backup)
            .await
            .fs_context("creating branding backup", &backup)?;

        // From here on the guard owns the backup and restores on any error.
        let guard = PatchGuard {
            patch: Some(AppliedPatch {
                target: target.to_path_buf(),
                backup,
            }),
        };

        let content = fs::read(target).await.fs_context("reading file to patch", target)?;
        let patched = patch_bytes(&content, substitutions);
        if patched != content {
            fs::write(target, patched)
                .await
                .fs_context("writing patched file", target)?;
        }

        log::info!("Temporarily patched {} for branding", target.display());
        Ok(guard)
    }
}

const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];

/// Apply `substitutions` to raw file content.
fn patch_bytes(content: &[u8], substitutions: &[Substitution]) -> Vec<u8> {
    if let Some(body) = content.strip_prefix(&UTF16LE_BOM)
        && body.len() % 2 == 0
    {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let patched = substitutions.iter().fold(units, |acc, s| {
            let from: Vec<u16> = s.from.encode_utf16().collect();
            let to: Vec<u16> = s.to.encode_utf16().collect();
            replace_all(&acc, &from, &to)
        });
        return UTF16LE_BOM
            .into_iter()
            .chain(patched.into_iter().flat_map(u16::to_le_bytes))
            .collect();
    }

    substitutions.iter().fold(content.to_vec(), |acc, s| {
        replace_all(&acc, s.from.as_bytes(), s.to.as_bytes())
    })
}

/// Replace every non-overlapping occurrence of `from`, scanning left to right.
fn replace_all<T: PartialEq + Copy>(haystack: &[T], from: &[T], to: &[T]) -> Vec<T> {
    if from.is_empty() {
        return haystack.to_vec();
    }
    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(from) {
            out.extend_from_slice(to);
            i += from.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}

#[derive(Debug)]
struct AppliedPatch {
    target: PathBuf,
    backup: PathBuf,
}

impl AppliedPatch {
    async fn restore(&self) -> Result<()> {
        fs::copy(&self.backup, &self.target)
            .await
            .fs_context("restoring from backup", &self.backup)?;
        fs::remove_file(&self.backup)
            .await
            .fs_context("removing backup", &self.backup)?;
        log::info!("Restored {} from backup", self.target.display());
        Ok(())
    }

    /// Used from `Drop`, which cannot await.
    fn restore_blocking(&self) -> Result<()> {
        std::fs::copy(&self.backup, &self.target).fs_context("restoring from backup", &self.backup)?;
        std::fs::remove_file(&self.backup).fs_context("removing backup", &self.backup)?;
        log::info!("Restored {} from backup", self.target.display());
        Ok(())
    }
}

/// Restores a patched file when restored explicitly or dropped.
#[derive(Debug)]
#[must_use = "dropping the guard restores the file immediately"]
pub struct PatchGuard {
    patch: Option<AppliedPatch>,
}

impl PatchGuard {
    /// Guard that restores nothing.
    pub fn empty() -> Self {
        Self { patch: None }
    }

    /// Whether this guard holds a patch.
    pub fn is_empty(&self) -> bool {
        self.patch.is_none()
    }

    /// Patched file, if any.
    pub fn target(&self) -> Option<&Path> {
        self.patch.as_ref().map(|p| p.target.as_path())
    }

    /// Restore now and report failures.
    pub async fn restore(mut self) -> Result<()> {
        match self.patch.take() {
            Some(patch) => patch.restore().await,
            None => Ok(()),
        }
    }

    /// Restore after a scoped step.
    ///
    /// The step's own error wins; a restore failure is only returned when
    /// the step succeeded.
    pub async fn finish<T>(self, step: Result<T>) -> Result<T> {
        let restored = self.restore().await;
        match (step, restored) {
            (Err(e), Err(restore_err)) => {
                log::warn!("Branding restore also failed: {}", restore_err);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(_), Err(restore_err)) => Err(restore_err),
            (Ok(value), Ok(())) => Ok(value),
        }
    }
}

impl Drop for PatchGuard {
    fn drop(&mut self) {
        if let Some(patch) = self.patch.take()
            && let Err(e) = patch.restore_blocking()
        {
            log::warn!("Could not restore {}: {}", patch.target.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subs(pairs: &[(&str, &str)]) -> Vec<Substitution> {
        pairs.iter().map(|(a, b)| Substitution::new(*a, *b)).collect()
    }

    fn utf16le(text: &str) -> Vec<u8> {
        UTF16LE_BOM
            .into_iter()
            .chain(text.encode_utf16().flat_map(u16::to_le_bytes))
            .collect()
    }

    #[tokio::test]
    async fn apply_then_restore_is_byte_identical() {
        let tmp = tempfile::tempdir().unwrap();
        let rc = tmp.path().join("Runner.rc");
        let original = "VALUE \"ProductName\", \"RustDesk\"\r\nVALUE \"OriginalFilename\", \"rustdesk.exe\"\r\n";
        std::fs::write(&rc, original).unwrap();

        let patcher = BrandingPatcher::new();
        let guard = patcher
            .apply(&rc, &subs(&[("\"RustDesk\"", "\"MDesk\""), ("\"rustdesk.exe\"", "\"MDesk.exe\"")]))
            .await
            .unwrap();

        let patched = std::fs::read_to_string(&rc).unwrap();
        assert!(patched.contains("\"MDesk\""));
        assert!(patched.contains("\"MDesk.exe\""));
        assert!(patcher.backup_path(&rc).exists());

        guard.restore().await.unwrap();
        assert_eq!(std::fs::read_to_string(&rc).unwrap(), original);
        assert!(!patcher.backup_path(&rc).exists());
    }

    #[tokio::test]
    async fn utf16_resource_script_is_patched_and_restored() {
        let tmp = tempfile::tempdir().unwrap();
        let rc = tmp.path().join("Runner.rc");
        let original = utf16le("VALUE \"ProductName\", \"RustDesk\"\r\n");
        std::fs::write(&rc, &original).unwrap();

        let guard = BrandingPatcher::new()
            .apply(&rc, &subs(&[("\"RustDesk\"", "\"MDesk\"")]))
            .await
            .unwrap();
        assert_eq!(
            std::fs::read(&rc).unwrap(),
            utf16le("VALUE \"ProductName\", \"MDesk\"\r\n")
        );

        guard.restore().await.unwrap();
        assert_eq!(std::fs::read(&rc).unwrap(), original);
    }

    #[tokio::test]
    async fn non_utf8_bytes_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("legacy.rc");
        let original = b"\xC4 RustDesk \xFF\x00A".to_vec();
        std::fs::write(&file, &original).unwrap();

        let guard = BrandingPatcher::new()
            .apply(&file, &subs(&[("RustDesk", "MDesk"), ("A", "B")]))
            .await
            .unwrap();
        assert_eq!(std::fs::read(&file).unwrap(), b"\xC4 MDesk \xFF\x00B".to_vec());

        guard.restore().await.unwrap();
        assert_eq!(std::fs::read(&file).unwrap(), original);
    }

    #[test]
    fn replace_all_is_left_to_right_and_non_overlapping() {
        assert_eq!(replace_all(b"aaa", b"aa", b"b"), b"ba".to_vec());
        assert_eq!(replace_all(b"abc", b"", b"x"), b"abc".to_vec());
    }

    #[tokio::test]
    async fn second_apply_overwrites_backup() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("Cargo.toml");
        std::fs::write(&file, "A A").unwrap();

        let patcher = BrandingPatcher::new();
        let first = patcher.apply(&file, &subs(&[("A", "B")])).await.unwrap();
        let second = patcher.apply(&file, &subs(&[("B", "C")])).await.unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "C C");

        second.restore().await.unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "B B");

        // The first guard's backup is gone; dropping it only logs.
        drop(first);
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "B B");
    }

    #[tokio::test]
    async fn drop_restores_on_failure_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("Runner.rc");
        std::fs::write(&file, "RustDesk").unwrap();

        let patcher = BrandingPatcher::new();
        let failing_step = async {
            let _guard = patcher.apply(&file, &subs(&[("RustDesk", "MDesk")])).await?;
            assert_eq!(std::fs::read_to_string(&file).unwrap(), "MDesk");
            Err::<(), _>(crate::error::ReleaseError::unsupported("compile failed"))
        };
        assert!(failing_step.await.is_err());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "RustDesk");
    }

    #[tokio::test]
    async fn finish_prefers_step_error() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("f");
        std::fs::write(&file, "x").unwrap();
        let guard = BrandingPatcher::new()
            .apply(&file, &subs(&[("x", "y")]))
            .await
            .unwrap();

        let out: Result<()> = guard
            .finish(Err(crate::error::ReleaseError::invalid_config("boom")))
            .await;
        assert!(matches!(
            out,
            Err(crate::error::ReleaseError::InvalidConfiguration { .. })
        ));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "x");
    }

    #[tokio::test]
    async fn missing_target_is_a_no_op() {
        let tmp = tempfile::tempdir().unwrap();
        let guard = BrandingPatcher::new()
            .apply(&tmp.path().join("absent.rc"), &subs(&[("a", "b")]))
            .await
            .unwrap();
        assert!(guard.is_empty());
        guard.restore().await.unwrap();
        assert!(!tmp.path().join("absent.rc.backup").exists());
    }
}

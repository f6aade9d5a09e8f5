//! Well-known locations inside the project checkout.

use crate::config::OsFamily;
use std::path::{Path, PathBuf};

/// Directory acquired resources are staged in, relative to the root.
pub const STAGING_DIR: &str = "resources";

/// Paths of a project checkout on a given host family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
    os: OsFamily,
}

impl ProjectPaths {
    /// Paths for the checkout at `root`.
    pub fn new(root: impl Into<PathBuf>, os: OsFamily) -> Self {
        Self {
            root: root.into(),
            os,
        }
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host family the paths were computed for.
    pub fn os(&self) -> OsFamily {
        self.os
    }

    /// `res/`: packaging resources (service files, icons, recipes).
    pub fn res(&self) -> PathBuf {
        self.root.join("res")
    }

    /// Flutter project directory.
    pub fn flutter(&self) -> PathBuf {
        self.root.join("flutter")
    }

    /// Flutter release bundle output for the host.
    pub fn flutter_build(&self) -> PathBuf {
        let rel = match self.os {
            OsFamily::Windows => "build/windows/x64/runner/Release",
            OsFamily::MacOs => "build/macos/Build/Products/Release",
            OsFamily::Linux => "build/linux/x64/release/bundle",
        };
        self.flutter().join(rel)
    }

    /// Cargo release output directory.
    pub fn release(&self) -> PathBuf {
        self.root.join("target/release")
    }

    /// Staging directory for acquired resources.
    pub fn staging(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// Portable packer crate.
    pub fn portable(&self) -> PathBuf {
        self.root.join("libs/portable")
    }

    /// Virtual display driver crate (Windows).
    pub fn virtual_display(&self) -> PathBuf {
        self.root.join("libs/virtual_display/dylib")
    }

    /// Windows runner resource script patched for branding.
    pub fn runner_rc(&self) -> PathBuf {
        self.flutter().join("windows/runner/Runner.rc")
    }

    /// Generated Dart FFI bridge.
    pub fn generated_bridge(&self) -> PathBuf {
        self.flutter().join("lib/generated_bridge.dart")
    }

    /// `path` relative to the root, for tool arguments run from the root.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flutter_build_dir_per_os() {
        let linux = ProjectPaths::new("/src", OsFamily::Linux);
        assert_eq!(
            linux.flutter_build(),
            PathBuf::from("/src/flutter/build/linux/x64/release/bundle")
        );
        let win = ProjectPaths::new("/src", OsFamily::Windows);
        assert!(win.flutter_build().ends_with("runner/Release"));
        assert_eq!(linux.relative(&linux.res()), Path::new("res"));
    }
}

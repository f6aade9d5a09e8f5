//! Host platform detection.
//!
//! The platform is computed once at startup and threaded through the run
//! explicitly; nothing re-inspects the host mid-run.

use serde::Deserialize;
use std::{fmt, path::Path};

/// Desktop operating system family.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    /// Microsoft Windows
    Windows,
    /// Apple macOS
    #[serde(rename = "osx", alias = "macos")]
    MacOs,
    /// Linux and every other unix-like host
    Linux,
}

impl OsFamily {
    /// All families, in catalog order.
    pub const ALL: [OsFamily; 3] = [OsFamily::Windows, OsFamily::MacOs, OsFamily::Linux];

    /// Family of the host this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            OsFamily::Windows
        } else if cfg!(target_os = "macos") {
            OsFamily::MacOs
        } else {
            OsFamily::Linux
        }
    }

    /// Token used in feature catalogs.
    pub fn token(&self) -> &'static str {
        match self {
            OsFamily::Windows => "windows",
            OsFamily::MacOs => "osx",
            OsFamily::Linux => "linux",
        }
    }

    /// Executable suffix on this family.
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            OsFamily::Windows => ".exe",
            _ => "",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Native package manager whose presence selects a Linux packaging path.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PackageManager {
    /// Arch / Manjaro
    Pacman,
    /// Fedora / CentOS
    Yum,
    /// openSUSE
    Zypper,
}

impl PackageManager {
    /// Probe order matches the precedence of packaging paths.
    const PROBES: [(PackageManager, &'static str); 3] = [
        (PackageManager::Pacman, "/usr/bin/pacman"),
        (PackageManager::Yum, "/usr/bin/yum"),
        (PackageManager::Zypper, "/usr/bin/zypper"),
    ];

    fn detect() -> Option<Self> {
        Self::PROBES
            .iter()
            .find(|(_, path)| Path::new(path).is_file())
            .map(|(pm, path)| {
                log::debug!("Detected package manager at {}", path);
                *pm
            })
    }
}

/// The host platform a run targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Platform {
    os: OsFamily,
    package_manager: Option<PackageManager>,
}

impl Platform {
    /// Build a platform value explicitly (tests, cross-host dry runs).
    pub fn new(os: OsFamily, package_manager: Option<PackageManager>) -> Self {
        // Package managers only steer Linux packaging.
        let package_manager = if os == OsFamily::Linux {
            package_manager
        } else {
            None
        };
        Self {
            os,
            package_manager,
        }
    }

    /// Inspect the host once.
    pub fn detect() -> Self {
        let os = OsFamily::current();
        let package_manager = match os {
            OsFamily::Linux => PackageManager::detect(),
            _ => None,
        };
        Self::new(os, package_manager)
    }

    /// Operating system family.
    pub fn os(&self) -> OsFamily {
        self.os
    }

    /// Detected native package manager (Linux only).
    pub fn package_manager(&self) -> Option<PackageManager> {
        self.package_manager
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.package_manager {
            Some(pm) => write!(f, "{} ({:?})", self.os, pm),
            None => write!(f, "{}", self.os),
        }
    }
}

//! Which artifact a host produces.

use crate::config::{OsFamily, PackageManager, Platform};
use std::fmt;

/// RPM-based distribution family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpmFlavor {
    /// yum hosts
    Fedora,
    /// zypper hosts
    Suse,
}

impl RpmFlavor {
    /// Spec file under `res/`.
    pub fn spec_file(&self) -> &'static str {
        match self {
            RpmFlavor::Fedora => "rpm.spec",
            RpmFlavor::Suse => "rpm-suse.spec",
        }
    }

    /// Artifact platform suffix.
    pub fn suffix(&self) -> &'static str {
        match self {
            RpmFlavor::Fedora => "fedora28-centos8",
            RpmFlavor::Suse => "suse",
        }
    }
}

/// Concrete packaging path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageTarget {
    /// Flutter bundle packed with `dpkg-deb`
    Deb,
    /// `cargo bundle` deb re-laid out and repacked
    DebBundle,
    /// Prebuilt folder packed with `dpkg-deb`, no compile
    DebFromFolder,
    /// `makepkg` package for Arch/Manjaro
    Pacman,
    /// `rpmbuild` package
    Rpm(RpmFlavor),
    /// Flutter app disk image
    Dmg,
    /// `cargo bundle` app disk image
    DmgBundle,
    /// Flutter build plus self-extracting portable executable
    WindowsPortable,
    /// Legacy UI installer executable
    WindowsInstaller,
}

impl PackageTarget {
    /// Pick the target for a host. A prebuilt folder always means a deb.
    pub fn select(platform: Platform, gui: bool, from_folder: bool) -> Self {
        match platform.os() {
            OsFamily::Windows if gui => PackageTarget::WindowsPortable,
            OsFamily::Windows => PackageTarget::WindowsInstaller,
            OsFamily::MacOs if gui => PackageTarget::Dmg,
            OsFamily::MacOs => PackageTarget::DmgBundle,
            OsFamily::Linux if from_folder => PackageTarget::DebFromFolder,
            OsFamily::Linux => match platform.package_manager() {
                Some(PackageManager::Pacman) => PackageTarget::Pacman,
                Some(PackageManager::Yum) => PackageTarget::Rpm(RpmFlavor::Fedora),
                Some(PackageManager::Zypper) => PackageTarget::Rpm(RpmFlavor::Suse),
                None if gui => PackageTarget::Deb,
                None => PackageTarget::DebBundle,
            },
        }
    }

    /// Whether already-built binaries can stand in for compiling.
    pub fn supports_skip_compile(&self, gui: bool) -> bool {
        match self {
            PackageTarget::DebFromFolder => true,
            PackageTarget::Deb
            | PackageTarget::Pacman
            | PackageTarget::Dmg
            | PackageTarget::WindowsPortable => gui,
            _ => false,
        }
    }

    /// Whether the target has a GUI build variant.
    pub fn supports_gui(&self) -> bool {
        !matches!(self, PackageTarget::Rpm(_))
    }
}

impl fmt::Display for PackageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageTarget::Deb => f.write_str("deb"),
            PackageTarget::DebBundle => f.write_str("deb (cargo bundle)"),
            PackageTarget::DebFromFolder => f.write_str("deb (prebuilt folder)"),
            PackageTarget::Pacman => f.write_str("pacman"),
            PackageTarget::Rpm(flavor) => write!(f, "rpm ({})", flavor.suffix()),
            PackageTarget::Dmg => f.write_str("dmg"),
            PackageTarget::DmgBundle => f.write_str("dmg (cargo bundle)"),
            PackageTarget::WindowsPortable => f.write_str("portable exe"),
            PackageTarget::WindowsInstaller => f.write_str("installer exe"),
        }
    }
}

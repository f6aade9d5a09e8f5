//! Project settings read from `[package.metadata.release]`.
//!
//! ```toml
//! [package.metadata.release]
//! product-name = "MDesk"
//! maintainer = "Release Team <release@example.com>"
//!
//! [package.metadata.release.features.PrivacyMode]
//! platforms = ["windows"]
//! zip-url = "https://example.com/privacy_mode.zip"
//! checksum-url = "https://example.com/checksums"
//! include = ["^privacy/"]
//! ```

use super::OsFamily;
use crate::error::{ErrorExt, Result};
use serde::Deserialize;
use std::{collections::BTreeMap, path::Path};

const DEFAULT_BINARY_NAME: &str = "rustdesk";
const DEFAULT_DESCRIPTION: &str = "A remote control software.";
const DEFAULT_SECTION: &str = "net";
const DEFAULT_MAINTAINER: &str = "Unknown";
const DEFAULT_RECOMMENDS: &[&str] = &["libayatana-appindicator3-1"];
const DEFAULT_DEPENDS: &[&str] = &[
    "libgtk-3-0",
    "libxcb-randr0",
    "libxdo3",
    "libxfixes3",
    "libxcb-shape0",
    "libxcb-xfixes0",
    "libasound2",
    "libsystemd0",
    "curl",
    "libva2",
    "libva-drm2",
    "libva-x11-2",
    "libgstreamer-plugins-base1.0-0",
    "libpam0g",
    "gstreamer1.0-pipewire",
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct ReleaseMetadata {
    product_name: Option<String>,
    package_name: Option<String>,
    binary_name: Option<String>,
    description: Option<String>,
    file_description: Option<String>,
    maintainer: Option<String>,
    homepage: Option<String>,
    section: Option<String>,
    depends: Option<Vec<String>>,
    recommends: Option<Vec<String>>,
    branding: BrandingMetadata,
    features: BTreeMap<String, FeatureMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct BrandingMetadata {
    upstream_name: Option<String>,
    upstream_description: Option<String>,
    upstream_exe: Option<String>,
}

/// A manifest-declared feature backed by a downloadable resource bundle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeatureMetadata {
    /// Platforms the feature applies to
    pub platforms: Vec<OsFamily>,
    /// Archive download URL
    pub zip_url: String,
    /// Checksum manifest URL
    pub checksum_url: String,
    /// Entry patterns to extract (empty = everything not excluded)
    #[serde(default)]
    pub include: Vec<String>,
    /// Entry patterns never to extract
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Identity strings the branding patcher replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandingSettings {
    /// Upstream product name, e.g. `RustDesk`
    pub upstream_name: String,
    /// Upstream file description
    pub upstream_description: String,
    /// Upstream executable file name
    pub upstream_exe: String,
}

/// Resolved project settings with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSettings {
    /// Display name of the product (Windows executables, dmg volume)
    pub product_name: String,
    /// Name used for package files
    pub package_name: String,
    /// Name of the compiled binary
    pub binary_name: String,
    /// Debian short description
    pub description: String,
    /// Windows `FileDescription`
    pub file_description: String,
    /// Package maintainer
    pub maintainer: String,
    /// Project homepage
    pub homepage: Option<String>,
    /// Debian section
    pub section: String,
    /// Debian `Depends`
    pub depends: Vec<String>,
    /// Debian `Recommends`
    pub recommends: Vec<String>,
    /// Branding substitution sources
    pub branding: BrandingSettings,
    /// Resource-bundle features, by name
    pub features: BTreeMap<String, FeatureMetadata>,
}

impl ReleaseSettings {
    /// Load settings from `<root>/Cargo.toml`.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join("Cargo.toml");
        let content = std::fs::read_to_string(&path).fs_context("reading manifest", &path)?;
        Self::from_manifest_str(&content)
    }

    /// Parse settings from manifest text.
    pub fn from_manifest_str(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;
        let package = table.get("package");

        let metadata: ReleaseMetadata = match package
            .and_then(|p| p.get("metadata"))
            .and_then(|m| m.get("release"))
        {
            Some(value) => value.clone().try_into()?,
            None => ReleaseMetadata::default(),
        };

        let str_field = |key: &str| {
            package
                .and_then(|p| p.get(key))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let first_author = package
            .and_then(|p| p.get("authors"))
            .and_then(|a| a.as_array())
            .and_then(|a| a.first())
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let binary_name = metadata
            .binary_name
            .or_else(|| str_field("name"))
            .unwrap_or_else(|| DEFAULT_BINARY_NAME.to_string());
        let product_name = metadata
            .product_name
            .unwrap_or_else(|| binary_name.clone());
        let package_name = metadata
            .package_name
            .unwrap_or_else(|| binary_name.clone());
        let file_description = metadata
            .file_description
            .unwrap_or_else(|| format!("{} Remote Desktop", product_name));

        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Ok(Self {
            description: metadata
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            maintainer: metadata
                .maintainer
                .or(first_author)
                .unwrap_or_else(|| DEFAULT_MAINTAINER.to_string()),
            homepage: metadata.homepage.or_else(|| str_field("homepage")),
            section: metadata
                .section
                .unwrap_or_else(|| DEFAULT_SECTION.to_string()),
            depends: metadata.depends.unwrap_or_else(|| owned(DEFAULT_DEPENDS)),
            recommends: metadata
                .recommends
                .unwrap_or_else(|| owned(DEFAULT_RECOMMENDS)),
            branding: BrandingSettings {
                upstream_name: metadata
                    .branding
                    .upstream_name
                    .unwrap_or_else(|| "RustDesk".to_string()),
                upstream_description: metadata
                    .branding
                    .upstream_description
                    .unwrap_or_else(|| "RustDesk Remote Desktop".to_string()),
                upstream_exe: metadata
                    .branding
                    .upstream_exe
                    .unwrap_or_else(|| "rustdesk.exe".to_string()),
            },
            features: metadata.features,
            product_name,
            package_name,
            binary_name,
            file_description,
        })
    }

    /// Windows executable produced by the GUI build, e.g. `MDesk.exe`.
    pub fn product_exe(&self) -> String {
        format!("{}.exe", self.product_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_package_name() {
        let settings = ReleaseSettings::from_manifest_str(
            r#"
[package]
name = "rustdesk"
version = "1.4.0"
authors = ["Jane Doe <jane@example.com>"]
"#,
        )
        .unwrap();

        assert_eq!(settings.binary_name, "rustdesk");
        assert_eq!(settings.package_name, "rustdesk");
        assert_eq!(settings.product_name, "rustdesk");
        assert_eq!(settings.maintainer, "Jane Doe <jane@example.com>");
        assert_eq!(settings.section, "net");
        assert_eq!(settings.depends.first().map(String::as_str), Some("libgtk-3-0"));
        assert_eq!(settings.branding.upstream_exe, "rustdesk.exe");
        assert!(settings.features.is_empty());
    }

    #[test]
    fn release_metadata_overrides() {
        let settings = ReleaseSettings::from_manifest_str(
            r#"
[package]
name = "rustdesk"
version = "1.4.0"

[package.metadata.release]
product-name = "MDesk"
homepage = "https://example.com"

[package.metadata.release.features.PrivacyMode]
platforms = ["windows", "osx"]
zip-url = "https://example.com/pm.zip"
checksum-url = "https://example.com/checksums"
exclude = ["^debug/"]
"#,
        )
        .unwrap();

        assert_eq!(settings.product_name, "MDesk");
        assert_eq!(settings.product_exe(), "MDesk.exe");
        assert_eq!(settings.file_description, "MDesk Remote Desktop");
        assert_eq!(settings.package_name, "rustdesk");
        assert_eq!(settings.homepage.as_deref(), Some("https://example.com"));

        let pm = &settings.features["PrivacyMode"];
        assert_eq!(pm.platforms, vec![OsFamily::Windows, OsFamily::MacOs]);
        assert!(pm.include.is_empty());
        assert_eq!(pm.exclude, vec!["^debug/".to_string()]);
    }

    #[test]
    fn malformed_metadata_is_an_error() {
        let result = ReleaseSettings::from_manifest_str(
            r#"
[package]
name = "x"

[package.metadata.release.features.Broken]
platforms = ["beos"]
zip-url = "u"
checksum-url = "c"
"#,
        );
        assert!(result.is_err());
    }
}

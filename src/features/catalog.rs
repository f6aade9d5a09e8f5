//! The process-wide catalog of known features.

use crate::config::{FeatureMetadata, OsFamily};
use crate::error::Result;
use crate::resources::EntryFilter;
use std::collections::BTreeMap;

/// Where to fetch a feature's runtime assets and which entries to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBundleDescriptor {
    /// Archive download URL
    pub zip_url: String,
    /// Checksum manifest URL
    pub checksum_url: String,
    /// Entry path patterns to keep; empty keeps everything not excluded
    pub include: Vec<String>,
    /// Entry path patterns to drop; wins over `include`
    pub exclude: Vec<String>,
}

/// One named optional capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureDef {
    /// Feature name as requested on the command line
    pub name: String,
    /// Platforms where the feature may be enabled
    pub platforms: Vec<OsFamily>,
    /// Runtime assets to acquire, if any
    pub bundle: Option<ResourceBundleDescriptor>,
    /// Whether the name is passed to the compiler as a cargo feature
    pub cargo: bool,
}

impl FeatureDef {
    fn capability(name: &str, platforms: &[OsFamily]) -> Self {
        Self {
            name: name.to_string(),
            platforms: platforms.to_vec(),
            bundle: None,
            cargo: true,
        }
    }

    /// Whether this feature may be enabled on `os`.
    pub fn applies_to(&self, os: OsFamily) -> bool {
        self.platforms.contains(&os)
    }
}

/// Mapping from feature name to its definition, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct FeatureCatalog {
    entries: Vec<FeatureDef>,
}

impl FeatureCatalog {
    /// Compiled-in capabilities toggled by CLI flags.
    pub fn builtin() -> Self {
        use OsFamily::*;
        Self {
            entries: vec![
                FeatureDef::capability("hwcodec", &[Windows, MacOs, Linux]),
                FeatureDef::capability("vram", &[Windows]),
                FeatureDef::capability("unix-file-copy-paste", &[MacOs, Linux]),
                FeatureDef::capability("screencapturekit", &[MacOs]),
            ],
        }
    }

    /// Build-in capabilities plus resource-bundle features from the manifest.
    ///
    /// Bundle patterns are compiled here so a bad pattern is reported as a
    /// configuration error before anything runs.
    pub fn with_bundles(bundles: &BTreeMap<String, FeatureMetadata>) -> Result<Self> {
        let mut catalog = Self::builtin();
        for (name, meta) in bundles {
            let bundle = ResourceBundleDescriptor {
                zip_url: meta.zip_url.clone(),
                checksum_url: meta.checksum_url.clone(),
                include: meta.include.clone(),
                exclude: meta.exclude.clone(),
            };
            EntryFilter::compile(&bundle)?;
            catalog.insert(FeatureDef {
                name: name.clone(),
                platforms: meta.platforms.clone(),
                bundle: Some(bundle),
                cargo: false,
            });
        }
        Ok(catalog)
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, def: FeatureDef) {
        match self.entries.iter_mut().find(|e| e.name == def.name) {
            Some(existing) => *existing = def,
            None => self.entries.push(def),
        }
    }

    /// Look up a feature by exact name.
    pub fn get(&self, name: &str) -> Option<&FeatureDef> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// All entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureDef> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_platforms() {
        let catalog = FeatureCatalog::builtin();
        let vram = catalog.get("vram").unwrap();
        assert!(vram.applies_to(OsFamily::Windows));
        assert!(!vram.applies_to(OsFamily::Linux));
        assert!(catalog.get("hwcodec").unwrap().cargo);
        assert!(catalog.get("bogus").is_none());
    }

    #[test]
    fn bundle_features_are_appended_and_validated() {
        let mut bundles = BTreeMap::new();
        bundles.insert(
            "PrivacyMode".to_string(),
            FeatureMetadata {
                platforms: vec![OsFamily::Windows],
                zip_url: "https://example.com/pm.zip".into(),
                checksum_url: "https://example.com/sums".into(),
                include: vec![],
                exclude: vec![],
            },
        );
        let catalog = FeatureCatalog::with_bundles(&bundles).unwrap();
        let pm = catalog.get("PrivacyMode").unwrap();
        assert!(!pm.cargo);
        assert!(pm.bundle.is_some());
        assert_eq!(catalog.iter().last().map(|d| d.name.as_str()), Some("PrivacyMode"));

        bundles.get_mut("PrivacyMode").unwrap().include = vec!["(".into()];
        assert!(FeatureCatalog::with_bundles(&bundles).is_err());
    }
}

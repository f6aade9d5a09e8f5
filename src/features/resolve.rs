//! Feature resolution against the catalog and the host platform.

use super::catalog::{FeatureCatalog, FeatureDef, ResourceBundleDescriptor};
use super::request::{FeatureRequest, is_wildcard};
use crate::config::OsFamily;
use std::fmt;

/// Build mode, which decides the baseline cargo feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildMode {
    /// Legacy UI with inlined assets
    Inline,
    /// Flutter GUI
    Flutter,
}

impl BuildMode {
    /// Mode for the `--flutter` flag.
    pub fn from_gui(gui: bool) -> Self {
        if gui {
            BuildMode::Flutter
        } else {
            BuildMode::Inline
        }
    }

    /// Cargo feature enabled for every build in this mode.
    pub fn baseline_feature(&self) -> &'static str {
        match self {
            BuildMode::Inline => "inline",
            BuildMode::Flutter => "flutter",
        }
    }

    /// Whether this is the Flutter GUI build.
    pub fn is_gui(&self) -> bool {
        matches!(self, BuildMode::Flutter)
    }
}

/// Non-fatal diagnostic raised while resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureWarning {
    /// Name not present in the catalog
    Unrecognized(String),
    /// Known name that does not apply to the host
    NotApplicable {
        /// Feature name
        name: String,
        /// Host family
        os: OsFamily,
    },
}

impl fmt::Display for FeatureWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureWarning::Unrecognized(name) => write!(f, "Unrecognized feature {}", name),
            FeatureWarning::NotApplicable { name, os } => {
                write!(f, "Feature {} is not available on {}, dropped", name, os)
            }
        }
    }
}

/// Ordered, de-duplicated, platform-valid features plus the build-mode baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFeatureSet {
    mode: BuildMode,
    features: Vec<FeatureDef>,
}

impl ResolvedFeatureSet {
    /// Set holding only the baseline.
    pub fn empty(mode: BuildMode) -> Self {
        Self {
            mode,
            features: Vec::new(),
        }
    }

    fn push(&mut self, def: &FeatureDef) {
        if !self.contains(&def.name) {
            self.features.push(def.clone());
        }
    }

    /// Build mode of the run.
    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Whether `name` was resolved.
    pub fn contains(&self, name: &str) -> bool {
        self.features.iter().any(|f| f.name == name)
    }

    /// Resolved catalog features, in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureDef> {
        self.features.iter()
    }

    /// Resolved catalog feature names.
    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    /// Number of resolved catalog features (the baseline is not counted).
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether no catalog feature resolved.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features that declare a resource bundle.
    pub fn bundles(&self) -> impl Iterator<Item = (&str, &ResourceBundleDescriptor)> {
        self.features
            .iter()
            .filter_map(|f| f.bundle.as_ref().map(|b| (f.name.as_str(), b)))
    }

    /// Cargo features for the compiler, baseline first.
    pub fn cargo_features(&self) -> Vec<&str> {
        std::iter::once(self.mode.baseline_feature())
            .chain(self.features.iter().filter(|f| f.cargo).map(|f| f.name.as_str()))
            .collect()
    }

    /// Comma-joined argument for `cargo build --features`.
    pub fn cargo_feature_arg(&self) -> String {
        self.cargo_features().join(",")
    }
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Features to enable
    pub features: ResolvedFeatureSet,
    /// Dropped names
    pub warnings: Vec<FeatureWarning>,
}

/// Resolve `request` against `catalog` for the host `os`.
pub fn resolve(
    catalog: &FeatureCatalog,
    request: &FeatureRequest,
    os: OsFamily,
    mode: BuildMode,
) -> Resolution {
    let names = match request {
        FeatureRequest::Wildcard => return resolve_all(catalog, os, mode),
        FeatureRequest::None => {
            return Resolution {
                features: ResolvedFeatureSet::empty(mode),
                warnings: Vec::new(),
            };
        }
        FeatureRequest::List(names) => names,
    };

    let mut features = ResolvedFeatureSet::empty(mode);
    let mut warnings = Vec::new();

    for name in names {
        if is_wildcard(name) {
            return resolve_all(catalog, os, mode);
        }
        match catalog.get(name) {
            Some(def) if def.applies_to(os) => features.push(def),
            Some(_) => warnings.push(FeatureWarning::NotApplicable {
                name: name.clone(),
                os,
            }),
            None => warnings.push(FeatureWarning::Unrecognized(name.clone())),
        }
    }

    let mut unique: Vec<FeatureWarning> = Vec::with_capacity(warnings.len());
    for warning in warnings {
        if !unique.contains(&warning) {
            unique.push(warning);
        }
    }
    Resolution {
        features,
        warnings: unique,
    }
}

fn resolve_all(catalog: &FeatureCatalog, os: OsFamily, mode: BuildMode) -> Resolution {
    let mut features = ResolvedFeatureSet::empty(mode);
    for def in catalog.iter().filter(|d| d.applies_to(os)) {
        features.push(def);
    }
    Resolution {
        features,
        warnings: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(names: &[&str]) -> FeatureRequest {
        FeatureRequest::List(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn unknown_names_warn_and_are_dropped() {
        let catalog = FeatureCatalog::builtin();
        let res = resolve(
            &catalog,
            &list(&["hwcodec", "bogus"]),
            OsFamily::Linux,
            BuildMode::Flutter,
        );
        assert_eq!(res.features.names(), vec!["hwcodec"]);
        assert_eq!(res.warnings, vec![FeatureWarning::Unrecognized("bogus".into())]);
    }

    #[test]
    fn wildcard_anywhere_equals_wildcard_alone() {
        let catalog = FeatureCatalog::builtin();
        for os in OsFamily::ALL {
            let alone = resolve(&catalog, &list(&["ALL"]), os, BuildMode::Inline);
            let wild = resolve(&catalog, &FeatureRequest::Wildcard, os, BuildMode::Inline);
            let mixed = resolve(&catalog, &list(&["bogus", "vram", "all", "hwcodec"]), os, BuildMode::Inline);
            assert_eq!(alone, wild);
            assert_eq!(alone, mixed);
        }
    }

    #[test]
    fn every_member_applies_to_platform() {
        let catalog = FeatureCatalog::builtin();
        for os in OsFamily::ALL {
            let res = resolve(&catalog, &FeatureRequest::Wildcard, os, BuildMode::Flutter);
            assert!(!res.features.is_empty());
            for def in res.features.iter() {
                assert!(catalog.get(&def.name).unwrap().applies_to(os));
            }
        }
    }

    #[test]
    fn inapplicable_toggles_are_dropped_with_warning() {
        let catalog = FeatureCatalog::builtin();
        let res = resolve(&catalog, &list(&["vram", "hwcodec"]), OsFamily::MacOs, BuildMode::Inline);
        assert_eq!(res.features.names(), vec!["hwcodec"]);
        assert_eq!(
            res.warnings,
            vec![FeatureWarning::NotApplicable {
                name: "vram".into(),
                os: OsFamily::MacOs
            }]
        );
    }

    #[test]
    fn duplicates_collapse() {
        let catalog = FeatureCatalog::builtin();
        let res = resolve(&catalog, &list(&["hwcodec", "hwcodec"]), OsFamily::Windows, BuildMode::Flutter);
        assert_eq!(res.features.len(), 1);
    }

    #[test]
    fn cargo_features_carry_baseline() {
        let catalog = FeatureCatalog::builtin();
        let res = resolve(&catalog, &list(&["hwcodec", "vram"]), OsFamily::Windows, BuildMode::Flutter);
        assert_eq!(res.features.cargo_feature_arg(), "flutter,hwcodec,vram");

        let res = resolve(&catalog, &FeatureRequest::None, OsFamily::Linux, BuildMode::Inline);
        assert_eq!(res.features.cargo_feature_arg(), "inline");
        assert!(res.warnings.is_empty());
    }
}

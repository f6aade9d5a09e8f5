//! Artifact naming: `<product>-<version>[-<suffix>].<ext>`.

use std::fmt;

/// Name of a produced installer file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    /// Product or package name
    pub product: String,
    /// Full version
    pub version: String,
    /// Platform suffix, e.g. `manjaro-arch`
    pub suffix: Option<String>,
    /// Extension without the leading dot, e.g. `pkg.tar.zst`
    pub ext: String,
}

impl ArtifactName {
    /// Name without a platform suffix.
    pub fn new(product: &str, version: &str, ext: &str) -> Self {
        Self {
            product: product.to_string(),
            version: version.to_string(),
            suffix: None,
            ext: ext.to_string(),
        }
    }

    /// Add a platform suffix.
    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.suffix = Some(suffix.to_string());
        self
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.product, self.version)?;
        if let Some(suffix) = &self.suffix {
            write!(f, "-{}", suffix)?;
        }
        write!(f, ".{}", self.ext)
    }
}

//! Debian `DEBIAN/control` generation.

use crate::config::{EnvOverrides, ReleaseSettings};
use std::fmt::Write as _;

/// Contents of a Debian control file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebControl {
    /// Package name
    pub package: String,
    /// Section, e.g. `net`
    pub section: String,
    /// Full version
    pub version: String,
    /// Debian architecture
    pub architecture: String,
    /// Maintainer line
    pub maintainer: String,
    /// Project homepage
    pub homepage: Option<String>,
    /// Runtime dependencies
    pub depends: Vec<String>,
    /// Recommended packages
    pub recommends: Vec<String>,
    /// Short description
    pub description: String,
}

impl DebControl {
    /// Control data for `version`, honoring the `DEB_ARCH` override.
    pub fn new(settings: &ReleaseSettings, env: &EnvOverrides, version: &str) -> Self {
        let mut depends = settings.depends.clone();
        depends.extend(env.deb_extra_depends().iter().map(|d| d.to_string()));
        Self {
            package: settings.package_name.clone(),
            section: settings.section.clone(),
            version: version.to_string(),
            architecture: env.deb_arch().to_string(),
            maintainer: settings.maintainer.clone(),
            homepage: settings.homepage.clone(),
            depends,
            recommends: settings.recommends.clone(),
            description: settings.description.clone(),
        }
    }

    /// Render in control-file syntax.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Package: {}", self.package);
        let _ = writeln!(out, "Section: {}", self.section);
        let _ = writeln!(out, "Priority: optional");
        let _ = writeln!(out, "Version: {}", self.version);
        let _ = writeln!(out, "Architecture: {}", self.architecture);
        let _ = writeln!(out, "Maintainer: {}", self.maintainer);
        if let Some(homepage) = &self.homepage {
            let _ = writeln!(out, "Homepage: {}", homepage);
        }
        if !self.depends.is_empty() {
            let _ = writeln!(out, "Depends: {}", self.depends.join(", "));
        }
        if !self.recommends.is_empty() {
            let _ = writeln!(out, "Recommends: {}", self.recommends.join(", "));
        }
        let _ = writeln!(out, "Description: {}", self.description);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[package]
name = "rustdesk"
version = "1.4.0"

[package.metadata.release]
product-name = "MDesk"
maintainer = "metadatalab <metadtlab@gmail.com>"
homepage = "https://www.mdesk.co.kr"
depends = ["libgtk-3-0", "curl"]
"#;

    #[test]
    fn renders_fields_in_order() {
        let settings = ReleaseSettings::from_manifest_str(MANIFEST).unwrap();
        let control = DebControl::new(&settings, &EnvOverrides::default(), "1.4.0.7");
        assert_eq!(
            control.render(),
            "Package: rustdesk\n\
             Section: net\n\
             Priority: optional\n\
             Version: 1.4.0.7\n\
             Architecture: amd64\n\
             Maintainer: metadatalab <metadtlab@gmail.com>\n\
             Homepage: https://www.mdesk.co.kr\n\
             Depends: libgtk-3-0, curl\n\
             Recommends: libayatana-appindicator3-1\n\
             Description: A remote control software.\n"
        );
    }

    #[test]
    fn armhf_adds_libatomic() {
        let settings = ReleaseSettings::from_manifest_str(MANIFEST).unwrap();
        let env = EnvOverrides {
            deb_arch: Some("armhf".into()),
            ..Default::default()
        };
        let control = DebControl::new(&settings, &env, "1.4.0.7");
        assert_eq!(control.architecture, "armhf");
        assert!(control.render().contains("Depends: libgtk-3-0, curl, libatomic1\n"));
    }
}

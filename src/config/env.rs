//! Environment variable overrides, read once at startup.

use std::path::PathBuf;

const DEFAULT_DEB_ARCH: &str = "amd64";
const DEFAULT_CERT_FILE: &str = "cert.pfx";

/// Environment-provided overrides for packaging metadata and signing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// `DEB_ARCH`
    pub deb_arch: Option<String>,
    /// `CERT_PASSWORD`, falling back to `P`
    pub cert_password: Option<String>,
    /// `CERT_FILE`
    pub cert_file: Option<PathBuf>,
    /// Home directory (rpmbuild writes its output below it)
    pub home: Option<PathBuf>,
}

impl EnvOverrides {
    /// Read the process environment.
    pub fn from_env() -> Self {
        let mut overrides = Self::from_lookup(|key| std::env::var(key).ok());
        overrides.home = dirs::home_dir();
        overrides
    }

    /// Build from an arbitrary lookup, e.g. a map in tests.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            deb_arch: get("DEB_ARCH"),
            cert_password: get("CERT_PASSWORD").or_else(|| get("P")),
            cert_file: get("CERT_FILE").map(PathBuf::from),
            home: get("HOME").map(PathBuf::from),
        }
    }

    /// Architecture written into the Debian control file.
    pub fn deb_arch(&self) -> &str {
        self.deb_arch.as_deref().unwrap_or(DEFAULT_DEB_ARCH)
    }

    /// Extra `Depends` entries required by the selected architecture.
    pub fn deb_extra_depends(&self) -> &'static [&'static str] {
        match self.deb_arch.as_deref() {
            // arm32v7 libsciter-gtk.so links against libatomic
            Some("armhf") => &["libatomic1"],
            _ => &[],
        }
    }

    /// Certificate used for Windows code signing.
    pub fn cert_file(&self) -> PathBuf {
        self.cert_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CERT_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let env = EnvOverrides::from_lookup(lookup(&[]));
        assert_eq!(env.deb_arch(), "amd64");
        assert!(env.deb_extra_depends().is_empty());
        assert_eq!(env.cert_password, None);
        assert_eq!(env.cert_file(), PathBuf::from("cert.pfx"));
    }

    #[test]
    fn armhf_pulls_in_libatomic() {
        let env = EnvOverrides::from_lookup(lookup(&[("DEB_ARCH", "armhf")]));
        assert_eq!(env.deb_arch(), "armhf");
        assert_eq!(env.deb_extra_depends(), &["libatomic1"]);
    }

    #[test]
    fn legacy_password_variable_and_empty_values() {
        let env = EnvOverrides::from_lookup(lookup(&[("CERT_PASSWORD", ""), ("P", "secret")]));
        assert_eq!(env.cert_password.as_deref(), Some("secret"));

        let env = EnvOverrides::from_lookup(lookup(&[("CERT_PASSWORD", "a"), ("P", "b")]));
        assert_eq!(env.cert_password.as_deref(), Some("a"));
    }
}

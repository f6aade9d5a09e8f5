//! Immutable per-run build configuration.

use super::{OsFamily, Platform};
use crate::error::{ReleaseError, Result};
use crate::features::{BuildMode, FeatureRequest};
use crate::packaging::PackageTarget;
use std::path::{Path, PathBuf};

/// Capability toggles given as individual flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureToggles {
    /// `--hwcodec`
    pub hwcodec: bool,
    /// `--vram`
    pub vram: bool,
    /// `--unix-file-copy-paste`
    pub unix_file_copy_paste: bool,
    /// `--screencapturekit`
    pub screencapturekit: bool,
}

impl FeatureToggles {
    /// Catalog names of the enabled toggles.
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.hwcodec, "hwcodec"),
            (self.vram, "vram"),
            (self.unix_file_copy_paste, "unix-file-copy-paste"),
            (self.screencapturekit, "screencapturekit"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }
}

/// Everything the command line decides about a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Host platform, detected once
    pub platform: Platform,
    /// Project checkout
    pub project_dir: PathBuf,
    /// `--feature` tokens
    pub request: FeatureRequest,
    /// Individual capability flags
    pub toggles: FeatureToggles,
    /// `--flutter`
    pub gui: bool,
    /// `--portable`
    pub portable: bool,
    /// `--skip-cargo`
    pub skip_compile: bool,
    /// `--skip-portable-pack`
    pub skip_portable_pack: bool,
    /// `--package <DIR>`
    pub package_from: Option<PathBuf>,
    /// `--proxy <URL>`
    pub proxy: Option<String>,
}

impl BuildConfig {
    /// Legacy build of the project at `project_dir` with nothing requested.
    pub fn new(platform: Platform, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            platform,
            project_dir: project_dir.into(),
            request: FeatureRequest::None,
            toggles: FeatureToggles::default(),
            gui: false,
            portable: false,
            skip_compile: false,
            skip_portable_pack: false,
            package_from: None,
            proxy: None,
        }
    }

    /// Feature tokens plus toggle names.
    pub fn feature_request(&self) -> FeatureRequest {
        self.request.clone().with_toggles(&self.toggles.names())
    }

    /// Baseline mode.
    pub fn build_mode(&self) -> BuildMode {
        BuildMode::from_gui(self.gui)
    }

    /// Packaging path for this host and flags.
    pub fn target(&self) -> PackageTarget {
        PackageTarget::select(self.platform, self.gui, self.package_from.is_some())
    }

    /// `--package` folder resolved against the project directory.
    pub fn package_dir(&self) -> Option<PathBuf> {
        self.package_from.as_deref().map(|dir| self.resolve(dir))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    /// Reject flag combinations the host cannot honor.
    ///
    /// Runs before any side effect and returns the selected target.
    pub fn validate(&self) -> Result<PackageTarget> {
        let os = self.platform.os();

        if let Some(dir) = self.package_dir() {
            if os != OsFamily::Linux {
                return Err(ReleaseError::unsupported(format!(
                    "--package builds a deb and needs a Linux host, not {}",
                    os
                )));
            }
            if !dir.is_dir() {
                return Err(ReleaseError::invalid_config(format!(
                    "--package folder {} does not exist",
                    dir.display()
                )));
            }
        }
        if self.portable && os != OsFamily::Windows {
            return Err(ReleaseError::unsupported(format!(
                "--portable is only available on Windows, not {}",
                os
            )));
        }
        if self.skip_portable_pack && !(os == OsFamily::Windows && self.gui) {
            return Err(ReleaseError::unsupported(
                "--skip-portable-pack requires --flutter on Windows",
            ));
        }

        let target = self.target();
        if self.gui && !target.supports_gui() {
            return Err(ReleaseError::unsupported(format!(
                "{} packaging has no --flutter build",
                target
            )));
        }
        if self.skip_compile && !target.supports_skip_compile(self.gui) {
            return Err(ReleaseError::unsupported(format!(
                "--skip-cargo is not supported for {} packaging{}",
                target,
                if self.gui { "" } else { " without --flutter" }
            )));
        }
        if let Some(proxy) = &self.proxy {
            url::Url::parse(proxy).map_err(|e| {
                ReleaseError::invalid_config(format!("invalid --proxy {:?}: {}", proxy, e))
            })?;
        }
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackageManager;

    fn linux() -> Platform {
        Platform::new(OsFamily::Linux, None)
    }

    fn windows() -> Platform {
        Platform::new(OsFamily::Windows, None)
    }

    #[test]
    fn toggles_extend_request() {
        let mut config = BuildConfig::new(linux(), ".");
        config.request = FeatureRequest::List(vec!["hwcodec".into()]);
        config.toggles.unix_file_copy_paste = true;
        assert_eq!(
            config.feature_request(),
            FeatureRequest::List(vec!["hwcodec".into(), "unix-file-copy-paste".into()])
        );
    }

    #[test]
    fn skip_compile_combinations() {
        let mut config = BuildConfig::new(linux(), ".");
        config.skip_compile = true;
        assert!(matches!(
            config.validate(),
            Err(ReleaseError::UnsupportedCombination { .. })
        ));

        config.gui = true;
        assert_eq!(config.validate().unwrap(), PackageTarget::Deb);

        config.platform = Platform::new(OsFamily::Linux, Some(PackageManager::Yum));
        assert!(config.validate().is_err());
    }

    #[test]
    fn windows_only_flags() {
        let mut config = BuildConfig::new(linux(), ".");
        config.skip_portable_pack = true;
        config.gui = true;
        assert!(config.validate().is_err());

        config.platform = windows();
        assert_eq!(config.validate().unwrap(), PackageTarget::WindowsPortable);

        let mut config = BuildConfig::new(linux(), ".");
        config.portable = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn package_folder_must_exist_on_linux() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = BuildConfig::new(linux(), tmp.path());
        config.package_from = Some(PathBuf::from("prebuilt"));
        assert!(matches!(
            config.validate(),
            Err(ReleaseError::InvalidConfiguration { .. })
        ));

        std::fs::create_dir(tmp.path().join("prebuilt")).unwrap();
        assert_eq!(config.validate().unwrap(), PackageTarget::DebFromFolder);

        config.platform = windows();
        assert!(matches!(
            config.validate(),
            Err(ReleaseError::UnsupportedCombination { .. })
        ));
    }

    #[test]
    fn proxy_must_be_a_url() {
        let mut config = BuildConfig::new(linux(), ".");
        config.proxy = Some("not a url".into());
        assert!(config.validate().is_err());
        config.proxy = Some("http://127.0.0.1:3128".into());
        assert!(config.validate().is_ok());
    }
}

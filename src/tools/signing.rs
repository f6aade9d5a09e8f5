//! Code signing with platform tools.
//!
//! Signing is optional: without credentials it is skipped with a notice.
//! Once credentials are present, a failing signer aborts the build.

use super::{
    best_effort::BestEffort,
    invocation::Invocation,
    runner::ToolRunner,
};
use crate::config::EnvOverrides;
use crate::error::Result;
use std::path::{Path, PathBuf};

const TIMESTAMP_URL: &str = "http://timestamp.digicert.com";

/// Authenticode signing with `signtool`.
#[derive(Debug, Clone)]
pub struct WindowsSigner {
    password: Option<String>,
    cert_file: PathBuf,
}

impl WindowsSigner {
    /// Signer configured from the environment; relative certificate paths
    /// resolve against `root`.
    pub fn from_env(env: &EnvOverrides, root: &Path) -> Self {
        Self {
            password: env.cert_password.clone(),
            cert_file: root.join(env.cert_file()),
        }
    }

    /// Sign `target`.
    pub async fn sign<R: ToolRunner>(&self, runner: &R, target: &Path) -> Result<BestEffort> {
        let Some(password) = &self.password else {
            return Ok(BestEffort::Skipped(
                "set CERT_PASSWORD or P to enable code signing".to_string(),
            ));
        };
        if !self.cert_file.is_file() {
            return Ok(BestEffort::Skipped(format!(
                "certificate file not found: {}",
                self.cert_file.display()
            )));
        }
        if !target.is_file() {
            return Ok(BestEffort::Skipped(format!(
                "executable not found: {}",
                target.display()
            )));
        }

        log::info!("Signing {}...", target.display());
        let invocation = Invocation::new("signtool")
            .args(["sign", "/a", "/v", "/p"])
            .secret_arg(password.clone())
            .arg("/f")
            .path_arg(&self.cert_file)
            .args(["/t", TIMESTAMP_URL])
            .path_arg(target);
        runner.run_checked(&invocation).await?;
        Ok(BestEffort::Applied)
    }
}

/// Developer ID signing with `codesign`.
#[derive(Debug, Clone)]
pub struct MacSigner {
    identity: Option<String>,
}

impl MacSigner {
    /// Signer whose identity name comes from the signing secret.
    pub fn from_env(env: &EnvOverrides) -> Self {
        Self {
            identity: env.cert_password.clone(),
        }
    }

    /// Sign `target` with the hardened runtime.
    pub async fn sign<R: ToolRunner>(&self, runner: &R, target: &Path) -> Result<BestEffort> {
        let Some(invocation) = self.invocation(target) else {
            return Ok(BestEffort::Skipped("Not signed".to_string()));
        };
        runner.run_checked(&invocation).await?;
        Ok(BestEffort::Applied)
    }

    /// The `codesign` command for `target`, or `None` without an identity.
    pub fn invocation(&self, target: &Path) -> Option<Invocation> {
        let identity = self.identity.as_ref()?;
        Some(
            Invocation::new("codesign")
                .arg("-s")
                .arg(format!("Developer ID Application: {}", identity))
                .args(["--force", "--options", "runtime"])
                .path_arg(target),
        )
    }
}

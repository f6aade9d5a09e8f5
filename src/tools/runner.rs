//! The tool capability and its process-spawning implementation.

use super::invocation::{Invocation, ToolOutput};
use crate::error::{ReleaseError, Result};
use std::path::PathBuf;
use tokio::process::Command;

/// Capability to run external tools.
#[allow(async_fn_in_trait)]
pub trait ToolRunner {
    /// Run to completion and capture the result. Only a failure to start
    /// the program is an error; a non-zero exit is reported in the output.
    async fn run(&self, invocation: &Invocation) -> Result<ToolOutput>;

    /// Run and turn a non-zero exit into [`ReleaseError::ToolFailed`].
    async fn run_checked(&self, invocation: &Invocation) -> Result<ToolOutput> {
        let output = self.run(invocation).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(ReleaseError::ToolFailed {
                command: invocation.command_line(),
                status: output.status_text(),
                output: output.combined(),
            })
        }
    }

    /// Find `program` on the search path.
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

/// Spawns real processes with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// New process runner.
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        log::info!("Running: {}", invocation.command_line());

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }

        let output = cmd.output().await.map_err(|error| ReleaseError::CommandFailed {
            command: invocation.program.clone(),
            error,
        })?;

        let output = ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !output.success() {
            log::debug!("{} exited with {}", invocation.program, output.status_text());
        }
        Ok(output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_exit_code_and_output() {
        let runner = ProcessRunner::new();
        let out = runner
            .run(&Invocation::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]))
            .await
            .unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");

        let err = runner
            .run_checked(&Invocation::new("sh").args(["-c", "exit 1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::ToolFailed { .. }));
    }

    #[tokio::test]
    async fn missing_program_is_command_failed() {
        let err = ProcessRunner::new()
            .run(&Invocation::new("definitely-not-a-real-tool-4242"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::CommandFailed { .. }));
    }
}

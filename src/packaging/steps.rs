//! Declarative build steps shared by compile plans and packaging layouts.
//!
//! All paths are absolute; builders resolve them against the project root
//! or the staging tree before handing steps to [`run_steps`].

use crate::error::{ErrorExt, ReleaseError, Result};
use crate::tools::{Invocation, ToolRunner};
use crate::utils::fs::{copy_dir, copy_file, move_file, set_executable};
use crate::version::replace_line_value;
use std::{io, path::PathBuf};

/// One filesystem or tool action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStep {
    /// Create a directory and its parents
    Dir(PathBuf),
    /// Copy one file; a missing optional source is logged and skipped
    Copy {
        /// Source file
        from: PathBuf,
        /// Destination file
        to: PathBuf,
        /// Fail if the source is missing
        required: bool,
    },
    /// Copy the contents of a directory into another
    CopyTree {
        /// Source directory
        from: PathBuf,
        /// Destination directory
        to: PathBuf,
        /// Fail if the source is missing
        required: bool,
    },
    /// Write a file
    Write {
        /// Destination file
        to: PathBuf,
        /// Content
        contents: String,
        /// Mark `a+x`
        executable: bool,
    },
    /// Move a file, replacing the destination
    Move {
        /// Source file
        from: PathBuf,
        /// Destination file
        to: PathBuf,
    },
    /// Move the first file matching a glob pattern
    MoveGlob {
        /// Glob pattern
        pattern: String,
        /// Destination file
        to: PathBuf,
    },
    /// (Re)create a symbolic link
    Symlink {
        /// Link target
        target: PathBuf,
        /// Link path
        link: PathBuf,
    },
    /// Replace literal text in a file; a missing file is logged and skipped
    Replace {
        /// File to edit
        file: PathBuf,
        /// Literal to find
        from: String,
        /// Replacement
        to: String,
    },
    /// Rewrite the value of lines starting with `prefix`
    Stamp {
        /// File to edit
        file: PathBuf,
        /// Line prefix, e.g. `pkgver=`
        prefix: String,
        /// New value
        value: String,
    },
    /// Fail unless a build output exists
    Expect {
        /// Expected path
        path: PathBuf,
        /// Hint shown when missing
        hint: String,
    },
    /// Run an external tool; non-zero exit is fatal
    Run(Invocation),
}

impl BuildStep {
    /// Shorthand for a required copy.
    pub fn copy(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        BuildStep::Copy {
            from: from.into(),
            to: to.into(),
            required: true,
        }
    }

    /// Shorthand for an optional copy.
    pub fn copy_optional(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        BuildStep::Copy {
            from: from.into(),
            to: to.into(),
            required: false,
        }
    }
}

/// Execute `steps` in order, stopping at the first failure.
pub async fn run_steps<R: ToolRunner>(steps: &[BuildStep], runner: &R) -> Result<()> {
    for step in steps {
        run_step(step, runner).await?;
    }
    Ok(())
}

async fn run_step<R: ToolRunner>(step: &BuildStep, runner: &R) -> Result<()> {
    match step {
        BuildStep::Dir(path) => tokio::fs::create_dir_all(path)
            .await
            .fs_context("creating directory", path),

        BuildStep::Copy { from, to, required } => {
            if !from.is_file() && !required {
                log::warn!("{} not found, skipped", from.display());
                return Ok(());
            }
            copy_file(from, to).await
        }

        BuildStep::CopyTree { from, to, required } => {
            if !from.is_dir() && !required {
                log::warn!("{} not found, skipped", from.display());
                return Ok(());
            }
            copy_dir(from, to).await.map(|_| ())
        }

        BuildStep::Write {
            to,
            contents,
            executable,
        } => {
            if let Some(parent) = to.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .fs_context("creating directory", parent)?;
            }
            tokio::fs::write(to, contents)
                .await
                .fs_context("writing file", to)?;
            if *executable {
                set_executable(to).await?;
            }
            Ok(())
        }

        BuildStep::Move { from, to } => move_file(from, to).await,

        BuildStep::MoveGlob { pattern, to } => {
            let found = glob::glob(pattern)
                .map_err(|e| ReleaseError::invalid_config(format!("bad glob {}: {}", pattern, e)))?
                .filter_map(|entry| entry.ok())
                .find(|p| p.is_file())
                .ok_or_else(|| ReleaseError::Fs {
                    context: "locating build output",
                    path: PathBuf::from(pattern),
                    error: io::Error::new(io::ErrorKind::NotFound, "no file matches"),
                })?;
            move_file(&found, to).await
        }

        BuildStep::Symlink { target, link } => {
            if link.symlink_metadata().is_ok() {
                tokio::fs::remove_file(link)
                    .await
                    .fs_context("replacing symlink", link)?;
            }
            #[cfg(unix)]
            {
                tokio::fs::symlink(target, link)
                    .await
                    .fs_context("creating symlink", link)
            }
            #[cfg(not(unix))]
            {
                let _ = target;
                Err(ReleaseError::unsupported(format!(
                    "symbolic link {} needs a unix host",
                    link.display()
                )))
            }
        }

        BuildStep::Replace { file, from, to } => {
            if !file.is_file() {
                log::warn!("{} not found, rewrite skipped", file.display());
                return Ok(());
            }
            let content = tokio::fs::read_to_string(file)
                .await
                .fs_context("reading file", file)?;
            tokio::fs::write(file, content.replace(from.as_str(), to))
                .await
                .fs_context("writing file", file)
        }

        BuildStep::Stamp {
            file,
            prefix,
            value,
        } => replace_line_value(file, prefix, value).map(|changed| {
            if !changed {
                log::debug!("{} already carries {}{}", file.display(), prefix, value);
            }
        }),

        BuildStep::Expect { path, hint } => {
            if path.exists() {
                Ok(())
            } else {
                Err(ReleaseError::Fs {
                    context: "locating build output",
                    path: path.clone(),
                    error: io::Error::new(io::ErrorKind::NotFound, hint.clone()),
                })
            }
        }

        BuildStep::Run(invocation) => runner.run_checked(invocation).await.map(|_| ()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ScriptedRunner, ToolOutput};

    #[tokio::test]
    async fn file_steps() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        std::fs::write(root.join("a.txt"), "bool ffi.Bool Function(DartPort").unwrap();
        std::fs::create_dir_all(root.join("target/bundle/deb")).unwrap();
        std::fs::write(root.join("target/bundle/deb/app_1.0_amd64.deb"), "deb").unwrap();

        let steps = vec![
            BuildStep::Dir(root.join("out/x")),
            BuildStep::copy(root.join("a.txt"), root.join("out/x/a.txt")),
            BuildStep::copy_optional(root.join("missing"), root.join("out/missing")),
            BuildStep::Write {
                to: root.join("out/polkit"),
                contents: "#!/bin/sh\n".into(),
                executable: true,
            },
            BuildStep::Replace {
                file: root.join("out/x/a.txt"),
                from: "ffi.Bool Function(DartPort".into(),
                to: "ffi.Uint8 Function(DartPort".into(),
            },
            BuildStep::MoveGlob {
                pattern: format!("{}/target/bundle/deb/app*.deb", root.display()),
                to: root.join("app.deb"),
            },
            BuildStep::Expect {
                path: root.join("app.deb"),
                hint: "bundle failed".into(),
            },
        ];
        run_steps(&steps, &ScriptedRunner::succeeding()).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(root.join("out/x/a.txt")).unwrap(),
            "bool ffi.Uint8 Function(DartPort"
        );
        assert!(!root.join("out/missing").exists());
        assert!(root.join("app.deb").is_file());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(root.join("out/polkit")).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[tokio::test]
    async fn failing_tool_and_missing_output_stop_the_plan() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new(|_| Ok(ToolOutput::failed(101, "error[E0425]")));
        let steps = vec![
            BuildStep::Run(Invocation::new("cargo").arg("build")),
            BuildStep::Dir(tmp.path().join("never")),
        ];
        let err = run_steps(&steps, &runner).await.unwrap_err();
        assert!(matches!(err, ReleaseError::ToolFailed { .. }));
        assert!(!tmp.path().join("never").exists());

        let err = run_steps(
            &[BuildStep::Expect {
                path: tmp.path().join("librustdesk.dll"),
                hint: "cargo build failed".into(),
            }],
            &ScriptedRunner::succeeding(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("cargo build failed"));
    }
}

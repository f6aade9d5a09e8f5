//! Error taxonomy for release-build operations.
//!
//! Every fatal condition of a run maps to one [`ReleaseError`] variant. Errors
//! raised inside an orchestrator state are wrapped in [`ReleaseError::Step`]
//! so the diagnostic names the state that failed.

use crate::orchestrator::BuildState;
use std::{fmt::Display, io, path::PathBuf};
use thiserror::Error;

/// Result type alias for desk_release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all desk_release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Bad CLI input or project configuration. Raised before any side effect.
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Reason for the error
        reason: String,
    },

    /// A staging or output path is occupied by the wrong kind of entry.
    #[error("Conflicting path {path}: {reason}")]
    ConflictingPath {
        /// Offending path
        path: PathBuf,
        /// What was expected there
        reason: String,
    },

    /// Downloaded bundle does not match its published checksum.
    #[error("Integrity check failed for {file}: expected {expected}, got {actual}")]
    IntegrityError {
        /// Archive file name
        file: String,
        /// Checksum from the checksum manifest
        expected: String,
        /// Checksum of the downloaded bytes
        actual: String,
    },

    /// Checksum manifest has no entry naming the archive.
    #[error("Checksum manifest {manifest_url} has no entry for {file}")]
    MissingChecksum {
        /// Archive file name
        file: String,
        /// Where the manifest was fetched from
        manifest_url: String,
    },

    /// Requested platform/flag combination is not implemented.
    #[error("Unsupported combination: {reason}")]
    UnsupportedCombination {
        /// Reason for the error
        reason: String,
    },

    /// Native packager exited non-zero. The staged tree is left for diagnosis.
    #[error("Packaging failed: `{command}` exited with {status}; staged tree kept at {staging}\n{output}")]
    PackagingFailed {
        /// Packager command line
        command: String,
        /// Exit status description
        status: String,
        /// Staged tree that was handed to the packager
        staging: PathBuf,
        /// Captured packager output
        output: String,
    },

    /// An external tool ran but exited non-zero.
    #[error("`{command}` exited with {status}\n{output}")]
    ToolFailed {
        /// Command line
        command: String,
        /// Exit status description
        status: String,
        /// Captured output
        output: String,
    },

    /// An external tool could not be started.
    #[error("failed to run command {command}: {error}")]
    CommandFailed {
        /// Command that failed to execute
        command: String,
        /// The underlying error
        error: io::Error,
    },

    /// File system error with path context.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Operation, e.g. "reading counter file"
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// HTTP transfer errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Archive could not be read
    #[error("Archive error: {0}")]
    Archive(String),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Manifest(#[from] toml::de::Error),

    /// TOML editing errors
    #[error("TOML edit error: {0}")]
    TomlEdit(#[from] toml_edit::TomlError),

    /// Error walking a directory tree
    #[error("{0}")]
    Walkdir(#[from] walkdir::Error),

    /// Path prefix stripping error
    #[error("{0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// An error raised while the orchestrator was in `state`.
    #[error("{state} failed: {source}")]
    Step {
        /// State that failed
        state: BuildState,
        /// Underlying error
        #[source]
        source: Box<ReleaseError>,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ReleaseError {
    /// Shorthand for [`ReleaseError::InvalidConfiguration`].
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        ReleaseError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`ReleaseError::UnsupportedCombination`].
    pub fn unsupported(reason: impl Into<String>) -> Self {
        ReleaseError::UnsupportedCombination {
            reason: reason.into(),
        }
    }

    /// Strip any [`ReleaseError::Step`] wrappers.
    pub fn root(&self) -> &ReleaseError {
        match self {
            ReleaseError::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// The orchestrator state this error was raised in, if known.
    pub fn failed_state(&self) -> Option<BuildState> {
        match self {
            ReleaseError::Step { state, .. } => Some(*state),
            _ => None,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self.root() {
            ReleaseError::InvalidConfiguration { .. } => vec![
                "Run with --help to review the accepted flags".to_string(),
                "Feature names may only contain letters, digits, '-' and '_'".to_string(),
            ],
            ReleaseError::ConflictingPath { path, .. } => vec![format!(
                "Move or delete {} and run again",
                path.display()
            )],
            ReleaseError::IntegrityError { file, .. } => vec![
                format!("The download of {} is corrupt or was tampered with", file),
                "Retry later or build the third-party resources yourself".to_string(),
            ],
            ReleaseError::MissingChecksum { .. } => vec![
                "Check the checksum-url of the feature in [package.metadata.release]".to_string(),
            ],
            ReleaseError::UnsupportedCombination { .. } => vec![
                "--skip-cargo needs --flutter (and is not available for rpm hosts)".to_string(),
                "--skip-portable-pack needs --flutter on Windows".to_string(),
            ],
            ReleaseError::PackagingFailed { staging, .. } => vec![format!(
                "Inspect the staged tree at {}",
                staging.display()
            )],
            ReleaseError::CommandFailed { command, .. } => {
                vec![format!("Ensure `{}` is installed and on PATH", command)]
            }
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

/// Extension trait for filesystem operations with automatic path context.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the operation,
    /// e.g., "reading file", "creating directory", "copying binary".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| ReleaseError::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Tag errors with the orchestrator state they were raised in.
pub trait StepContext<T> {
    /// Wrap the error in [`ReleaseError::Step`] unless it already names a state.
    fn in_state(self, state: BuildState) -> Result<T>;
}

impl<T> StepContext<T> for Result<T> {
    fn in_state(self, state: BuildState) -> Result<T> {
        self.map_err(|e| match e {
            step @ ReleaseError::Step { .. } => step,
            other => ReleaseError::Step {
                state,
                source: Box::new(other),
            },
        })
    }
}

/// Map archive-library errors, which carry no path, into [`ReleaseError::Archive`].
pub(crate) fn archive_error(context: &str, error: impl Display) -> ReleaseError {
    ReleaseError::Archive(format!("{context}: {error}"))
}

/// Map a failed `spawn_blocking` join into an I/O error.
pub(crate) fn join_error(context: &str, error: tokio::task::JoinError) -> ReleaseError {
    ReleaseError::Io(io::Error::other(format!("{context} task failed: {error}")))
}

//! Outcomes of steps whose failure does not abort the build.

use std::fmt;

/// Outcome of a best-effort step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort {
    /// The step ran and succeeded
    Applied,
    /// The step did not run
    Skipped(String),
    /// The step ran and failed; the build continues
    FailedNonFatal(String),
}

impl BestEffort {
    /// Whether the step took effect.
    pub fn is_applied(&self) -> bool {
        matches!(self, BestEffort::Applied)
    }
}

impl fmt::Display for BestEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BestEffort::Applied => f.write_str("applied"),
            BestEffort::Skipped(reason) => write!(f, "skipped ({})", reason),
            BestEffort::FailedNonFatal(reason) => write!(f, "failed, continuing ({})", reason),
        }
    }
}

/// A best-effort outcome attached to the step and file it concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Step name, e.g. `sign MDesk.exe`
    pub step: String,
    /// What happened
    pub outcome: BestEffort,
}

impl Notice {
    /// Record `outcome` for `step`, logging anything other than success.
    pub fn new(step: impl Into<String>, outcome: BestEffort) -> Self {
        let step = step.into();
        match &outcome {
            BestEffort::Applied => log::info!("{}: applied", step),
            BestEffort::Skipped(reason) => log::info!("{}: skipped, {}", step, reason),
            BestEffort::FailedNonFatal(reason) => log::warn!("{}: failed, {}", step, reason),
        }
        Self { step, outcome }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.outcome)
    }
}

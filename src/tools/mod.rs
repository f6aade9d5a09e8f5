//! External tool invocation.
//!
//! Every external program the build drives (compiler, flutter, packagers,
//! signers, python helpers) goes through the [`ToolRunner`] capability, so
//! the orchestrator can be exercised with a [`ScriptedRunner`] instead of
//! real processes.

mod best_effort;
mod invocation;
mod metadata;
mod runner;
mod scripted;
mod signing;

pub use best_effort::{BestEffort, Notice};
pub use invocation::{Invocation, ToolOutput};
pub use metadata::edit_exe_metadata;
pub use runner::{ProcessRunner, ToolRunner};
pub use scripted::ScriptedRunner;
pub use signing::{MacSigner, WindowsSigner};

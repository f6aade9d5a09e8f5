//! Command execution.

mod build;
mod set_version;

use crate::cli::{Args, Command, OutputManager};
use crate::error::Result;

use build::execute_build;
use set_version::execute_set_version;

/// Execute the command selected by `args`.
///
/// Returns the process exit code. Errors propagate to the caller, which
/// prints them with recovery suggestions.
pub async fn execute_command(args: Args) -> Result<i32> {
    let output = OutputManager::new(args.verbose, args.quiet);

    match &args.command {
        Some(Command::SetVersion {
            version,
            build_number,
        }) => execute_set_version(&args, version, *build_number, &output),
        None => execute_build(&args, &output).await,
    }
}

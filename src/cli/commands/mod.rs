//! Command execution.
//!
//! Each subcommand returns the process exit code; fatal errors bubble up to
//! `main`, which prints them with recovery suggestions.

mod check;
mod plan;
mod release;

use crate::cli::{Args, Command, OutputManager};
use crate::error::{CliError, Result};

use check::execute_check;
use plan::execute_plan;
use release::execute_release;

/// Execute the selected command
pub async fn execute_command(args: Args) -> Result<i32> {
    if let Err(reason) = args.validate() {
        return Err(CliError::InvalidArguments { reason }.into());
    }

    let output = OutputManager::new(args.options.json);
    let command = args.command();
    log::debug!("Executing '{}' with {:?}", command.name(), args.options);

    match command {
        Command::Release => execute_release(&args, &output).await,
        Command::Plan => execute_plan(&args, &output),
        Command::Check => execute_check(&args, &output),
    }
}

/// Print a serializable value as pretty JSON on stdout
pub(super) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{}", rendered);
    Ok(())
}

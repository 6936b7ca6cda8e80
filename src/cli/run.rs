//! Run command.
//!
//! Exports a store's secrets into the environment and runs a command that
//! inherits them.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::cli::{Context, IdentityArgs};
use crate::error::{Error, Result};

/// Run `command` with the store's secrets as environment variables.
pub fn execute(ctx: &Context, file: &Path, unlock: &IdentityArgs, command: &[String]) -> Result<()> {
    let exit_code = run_with_secrets(ctx, file, unlock, command)?;
    std::process::exit(exit_code);
}

fn run_with_secrets(
    ctx: &Context,
    file: &Path,
    unlock: &IdentityArgs,
    command: &[String],
) -> Result<i32> {
    let Some((program, args)) = command.split_first() else {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "no command specified",
        )));
    };

    let identity = ctx.identity(unlock)?;
    let exported = ctx.store().export(file, identity.as_ref())?;
    debug!(count = exported.len(), program = %program, "running with secrets");

    let status = Command::new(program).args(args).status();
    exported.restore();

    // Signals have no exit code; report a generic failure.
    Ok(status?.code().unwrap_or(1))
}

//! Subprocess plumbing for the external tools.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Resolve a tool on PATH (or an explicit path).
///
/// # Errors
///
/// Returns `Error::BackendUnavailable` if the tool cannot be found.
pub(crate) fn locate(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|_| Error::BackendUnavailable {
        tool: program.to_string(),
    })
}

/// Run a command to completion, feeding `input` on stdin.
///
/// Stdin is written from a scoped thread while stdout/stderr are drained,
/// so payloads larger than a pipe buffer cannot deadlock.
pub(crate) fn run(tool: &str, mut cmd: Command, input: Option<&[u8]>) -> Result<Output> {
    debug!(tool, "spawning");

    cmd.stdin(if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::BackendUnavailable {
                tool: tool.to_string(),
            }
        } else {
            Error::backend(tool, format!("failed to spawn: {}", e))
        }
    })?;

    let stdin = child.stdin.take();
    let output = std::thread::scope(|scope| {
        let feeder = match (stdin, input) {
            (Some(mut pipe), Some(data)) => Some(scope.spawn(move || pipe.write_all(data))),
            _ => None,
        };
        let output = child.wait_with_output();
        if let Some(Ok(Err(e))) = feeder.map(|handle| handle.join()) {
            // A tool that rejects its arguments exits before reading stdin.
            trace!(tool, error = %e, "stdin closed early");
        }
        output
    })
    .map_err(|e| Error::backend(tool, format!("failed to wait: {}", e)))?;

    trace!(
        tool,
        status = ?output.status.code(),
        stdout_len = output.stdout.len(),
        "finished"
    );
    Ok(output)
}

/// Trimmed stderr of a finished tool, for error messages.
pub(crate) fn stderr_text(output: &Output) -> String {
    let text = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if text.is_empty() {
        format!("exited with status {:?}", output.status.code())
    } else {
        text
    }
}

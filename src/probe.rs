//! Capability checks for external tools

use std::ffi::OsStr;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Run `program` with `args` and report whether it exited successfully
///
/// All output is discarded. A program that cannot be spawned counts as unavailable; this
/// never returns an error.
pub async fn probe_tool(program: impl AsRef<OsStr>, args: &[&str]) -> bool {
    let program = program.as_ref();
    match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        Ok(status) => {
            debug!(program = ?program, ?args, %status, "tool probe finished");
            status.success()
        }
        Err(e) => {
            debug!(program = ?program, error = %e, "tool probe could not spawn");
            false
        }
    }
}

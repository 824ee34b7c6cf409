//! External command execution shared by the compositor and the animator.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Number of trailing stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Why an external command did not complete successfully.
#[derive(Debug)]
pub(crate) enum CommandFailure {
    /// The program does not exist.
    NotFound,
    /// The program ran and exited unsuccessfully.
    Exited { code: Option<i32>, stderr: String },
    /// The program exceeded its time limit and was killed.
    TimedOut,
    /// Spawning or waiting failed for another reason.
    Io(std::io::Error),
}

/// Runs `program` with `args` and waits for it to exit.
///
/// The child is killed if it outlives `timeout_secs`.
pub(crate) async fn run_command(
    program: &Path,
    args: &[String],
    timeout_secs: u64,
) -> Result<(), CommandFailure> {
    debug!(program = %program.display(), ?args, "Running external command");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CommandFailure::NotFound
            } else {
                CommandFailure::Io(e)
            }
        })?;

    let output = match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(CommandFailure::Io(e)),
        Err(_) => return Err(CommandFailure::TimedOut),
    };

    if output.status.success() {
        Ok(())
    } else {
        Err(CommandFailure::Exited {
            code: output.status.code(),
            stderr: stderr_tail(&output.stderr),
        })
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

//! Bounded subprocess execution.
//!
//! Runtime CLI calls must never hang the dashboard: the child is polled
//! against a wall-clock deadline and killed when it overruns.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use dockboard_common::error::{DockboardError, Result};

const POLL_INTERVAL_MS: u64 = 20;

/// Output from a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Exit code, `-1` when the process was killed by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    /// Returns whether the process exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs `program` with `args`, killing it once `timeout` elapses.
///
/// A non-zero exit is not an error here; callers classify it.
///
/// # Errors
///
/// Returns `RuntimeUnavailable` if the process cannot be spawned, cannot be
/// waited on, or exceeds the timeout.
pub fn run_bounded(program: &Path, args: &[String], timeout: Duration) -> Result<CommandOutput> {
    let shown = format!("{} {}", program.display(), args.join(" "));
    tracing::debug!(command = %shown, timeout_secs = timeout.as_secs(), "running command");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| DockboardError::runtime(format!("failed to spawn `{shown}`: {e}")))?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                tracing::warn!(command = %shown, "command timed out, killed");
                return Err(DockboardError::runtime(format!(
                    "`{shown}` timed out after {}s",
                    timeout.as_secs_f32()
                )));
            }
            Ok(None) => thread::sleep(Duration::from_millis(POLL_INTERVAL_MS)),
            Err(e) => {
                let _ = child.kill();
                return Err(DockboardError::runtime(format!(
                    "failed waiting for `{shown}`: {e}"
                )));
            }
        }
    };

    Ok(CommandOutput {
        stdout: collect(stdout),
        stderr: collect(stderr),
        exit_code: status.code().unwrap_or(-1),
    })
}

/// Reads a pipe to completion on its own thread so a chatty child cannot
/// block on a full pipe buffer while it is being polled.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

//! Engine subprocess handle: launch, line writes, and termination.

use crate::config::WrapperConfig;
use crate::error::{Result, WrapperError};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

/// Builds the launch command for the engine with one weights file.
///
/// Bare binary names are resolved against PATH; if resolution fails the
/// name is passed through and the spawn error surfaces as `Startup`.
pub fn launch_command(config: &WrapperConfig, weights: &Path) -> Command {
    let binary = config.engine.binary.clone();
    let resolved = which::which(&binary).unwrap_or(binary);
    let mut command = Command::new(resolved);
    command.arg(format!("--weights={}", weights.display()));
    command
}

/// One live engine subprocess with its captured stdin.
///
/// The stdout/stderr streams are handed to line pumps at spawn time; the
/// handle keeps only what it needs to write commands and stop the process.
pub struct EngineProcess {
    child: Child,
    stdin: ChildStdin,
    binary: String,
}

impl EngineProcess {
    /// Spawns the engine from a prepared command, returning the handle
    /// plus its stdout and stderr streams for the pumps.
    pub fn spawn(mut command: Command) -> Result<(Self, ChildStdout, ChildStderr)> {
        let binary = command
            .as_std()
            .get_program()
            .to_string_lossy()
            .into_owned();

        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| WrapperError::Startup {
            binary: binary.clone(),
            source,
        })?;

        let stdin = take_stream(child.stdin.take(), &binary, "stdin")?;
        let stdout = take_stream(child.stdout.take(), &binary, "stdout")?;
        let stderr = take_stream(child.stderr.take(), &binary, "stderr")?;

        info!(binary = %binary, pid = child.id(), "engine process started");
        Ok((
            Self {
                child,
                stdin,
                binary,
            },
            stdout,
            stderr,
        ))
    }

    /// Writes one line plus terminator and flushes immediately.
    ///
    /// A dead process or failed write drops the command with a warning;
    /// this is never fatal to the session.
    pub async fn send(&mut self, line: &str) {
        if let Ok(Some(status)) = self.child.try_wait() {
            warn!(binary = %self.binary, %status, "engine has exited, dropping command");
            return;
        }
        let payload = format!("{line}\n");
        if let Err(e) = self.stdin.write_all(payload.as_bytes()).await {
            warn!(binary = %self.binary, error = %e, "write to engine failed, dropping command");
            return;
        }
        if let Err(e) = self.stdin.flush().await {
            warn!(binary = %self.binary, error = %e, "flush to engine failed");
        }
    }

    /// Kills the process if it is still running. Safe to call repeatedly;
    /// an already-exited process is a no-op.
    pub async fn terminate(&mut self) {
        if let Ok(Some(status)) = self.child.try_wait() {
            debug!(binary = %self.binary, %status, "engine already exited");
            return;
        }
        info!(binary = %self.binary, "killing engine process");
        if let Err(e) = self.child.start_kill() {
            warn!(binary = %self.binary, error = %e, "kill failed");
        }
        if let Err(e) = self.child.wait().await {
            warn!(binary = %self.binary, error = %e, "wait after kill failed");
        }
    }

    /// Waits up to `timeout` for the process to exit on its own, as after
    /// a forwarded `quit`. Returns whether it exited in time.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(Ok(status)) => {
                info!(binary = %self.binary, %status, "engine exited");
                true
            }
            Ok(Err(e)) => {
                warn!(binary = %self.binary, error = %e, "wait on engine failed");
                false
            }
            Err(_) => {
                warn!(binary = %self.binary, "engine did not exit within timeout");
                false
            }
        }
    }
}

fn take_stream<T>(stream: Option<T>, binary: &str, name: &str) -> Result<T> {
    stream.ok_or_else(|| WrapperError::Startup {
        binary: binary.to_string(),
        source: std::io::Error::other(format!("{name} was not captured")),
    })
}

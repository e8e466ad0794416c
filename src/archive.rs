//! The external archiving process.
//!
//! The service treats `zip` as a black box: point it at a folder, read the
//! archive from its stdout, reap it when done. Exit status is collected but
//! never inspected for success — a half-written archive shows up as a
//! truncated download, which is all a one-shot stream can say about it.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::process::{Child, ChildStdout, Command};
use tracing::debug;

/// Failure to launch the archiving process.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("archiver `{0}` not found on PATH")]
    MissingBinary(String),

    #[error("failed to spawn `{0}`: {1}")]
    Io(String, #[source] std::io::Error),
}

/// Builds the archiving command for one folder: recurse into it, take only
/// `*.jpg` and `*.png`, write the zip to stdout, stay quiet.
pub struct ZipCommand {
    dir: PathBuf,
}

impl ZipCommand {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Launches the process with stdout piped.
    pub fn spawn(self) -> Result<ZipProcess, SpawnError> {
        let mut cmd = Command::new("zip");
        cmd.arg("-q")
            .arg("-")
            .arg("-r")
            .arg(&self.dir)
            .arg("-i")
            .arg("*.jpg")
            .arg("*.png");
        ZipProcess::spawn("zip", cmd)
    }
}

/// A running archiving process.
///
/// The owner must [`wait`](ZipProcess::wait) on every path before dropping
/// the handle, and [`kill`](ZipProcess::kill) first when the stream was cut
/// short. As a backstop for runtime teardown, the child is also configured
/// to be killed if the handle is dropped unreaped.
pub struct ZipProcess {
    child: Child,
    stdout: ChildStdout,
    pid: u32,
    killed: bool,
}

impl ZipProcess {
    pub(crate) fn spawn(program: &str, mut cmd: Command) -> Result<Self, SpawnError> {
        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => SpawnError::MissingBinary(program.to_owned()),
                _ => SpawnError::Io(program.to_owned(), e),
            })?;

        let pid = child.id().unwrap_or_default();
        let Some(stdout) = child.stdout.take() else {
            // Unreachable with the piped stdout above, but not worth a panic.
            return Err(SpawnError::Io(
                program.to_owned(),
                std::io::Error::other("stdout pipe was not captured"),
            ));
        };

        Ok(Self { child, stdout, pid, killed: false })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// The archive byte stream — the process's stdout.
    pub fn output(&mut self) -> &mut ChildStdout {
        &mut self.stdout
    }

    /// Best-effort immediate termination. Idempotent; signalling a process
    /// that has already exited is a no-op.
    pub fn kill(&mut self) {
        if self.killed {
            return;
        }
        self.killed = true;
        if let Err(e) = self.child.start_kill() {
            debug!(pid = self.pid, "kill skipped, process already gone: {e}");
        }
    }

    /// Reaps the process and returns its exit status. Runs on every path,
    /// killed or not, so the child never lingers as a zombie.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let cmd = Command::new("zipserve-no-such-binary");
        let Err(err) = ZipProcess::spawn("zipserve-no-such-binary", cmd) else {
            panic!("spawn of a missing binary should fail");
        };
        assert!(matches!(err, SpawnError::MissingBinary(ref name) if name == "zipserve-no-such-binary"));
    }

    #[tokio::test]
    async fn kill_is_idempotent_and_always_reapable() {
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        let mut proc = ZipProcess::spawn("sleep", cmd).expect("sleep should spawn");

        proc.kill();
        proc.kill();
        let status = proc.wait().await.expect("wait after kill");
        assert!(!status.success());
    }

    #[tokio::test]
    async fn kill_after_exit_is_a_no_op() {
        let cmd = Command::new("true");
        let mut proc = ZipProcess::spawn("true", cmd).expect("true should spawn");

        let status = proc.wait().await.expect("wait");
        assert!(status.success());
        proc.kill();
    }
}

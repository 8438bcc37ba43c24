//! Graceful shutdown for `tokio::process::Child` with SIGTERM → SIGKILL escalation.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The process had exited before any signal was sent.
    AlreadyExited(ExitStatus),
    /// The process exited within the grace period after SIGTERM.
    Graceful(ExitStatus),
    /// The process had to be force-killed.
    Killed(ExitStatus),
}

impl ShutdownOutcome {
    pub const fn status(self) -> ExitStatus {
        match self {
            Self::AlreadyExited(s) | Self::Graceful(s) | Self::Killed(s) => s,
        }
    }
}

/// Shut down a child process, escalating to a forceful kill.
///
/// # Strategy
/// 1. Send SIGTERM and wait up to `grace` for the process to exit
/// 2. If still running, send SIGKILL
/// 3. Wait up to `kill_confirm` for reaping
///
/// Every wait is bounded. An `Err` of kind `TimedOut` means SIGKILL was
/// sent but the exit was not observed; the caller should drop the handle
/// and move on.
///
/// # Platform behavior
/// - Unix: SIGTERM via nix, SIGKILL via `start_kill`
/// - Windows: immediately `start_kill` (no graceful shutdown available)
pub async fn shutdown_child(
    child: &mut Child,
    grace: Duration,
    kill_confirm: Duration,
) -> io::Result<ShutdownOutcome> {
    if let Some(status) = child.try_wait()? {
        return Ok(ShutdownOutcome::AlreadyExited(status));
    }

    #[cfg(unix)]
    {
        if let Some(status) = terminate_unix(child, grace).await? {
            return Ok(ShutdownOutcome::Graceful(status));
        }
    }

    #[cfg(not(unix))]
    let _ = grace;

    child.start_kill()?;
    match timeout(kill_confirm, child.wait()).await {
        Ok(status) => Ok(ShutdownOutcome::Killed(status?)),
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "process did not exit after SIGKILL",
        )),
    }
}

/// Phase 1: SIGTERM and a bounded wait. `None` means still running.
#[cfg(unix)]
async fn terminate_unix(child: &mut Child, grace: Duration) -> io::Result<Option<ExitStatus>> {
    let Some(pid) = child.id() else {
        // Already reaped by tokio
        return child.wait().await.map(Some);
    };
    let pid = i32::try_from(pid).map_err(io::Error::other)?;

    if let Err(e) = signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
        // Process may have already exited
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await.map(Some);
        }
        return Err(io::Error::other(e));
    }

    match timeout(grace, child.wait()).await {
        Ok(result) => result.map(Some),
        Err(_) => Ok(None),
    }
}

//! Graceful engine process termination.

use std::io;
use std::process::ExitStatus;

use tokio::process::Child;

#[cfg(unix)]
use tokio::time::{Duration, timeout};

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Time the engine gets to release GPU memory after SIGTERM.
#[cfg(unix)]
const GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Terminate a child process gracefully.
///
/// On Unix: SIGTERM, wait up to the grace period, then SIGKILL.
/// Elsewhere: kill immediately.
pub async fn shutdown_child(mut child: Child) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        shutdown_unix(&mut child).await
    }

    #[cfg(not(unix))]
    {
        child.kill().await?;
        child.wait().await
    }
}

#[cfg(unix)]
async fn shutdown_unix(child: &mut Child) -> io::Result<ExitStatus> {
    let Some(pid) = child.id() else {
        // Already reaped
        return child.wait().await;
    };
    let pid = i32::try_from(pid).map_err(io::Error::other)?;

    if let Err(e) = signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = timeout(GRACE_PERIOD, child.wait()).await {
        return result;
    }

    tracing::warn!(pid, "Engine ignored SIGTERM, sending SIGKILL");
    child.kill().await?;
    child.wait().await
}

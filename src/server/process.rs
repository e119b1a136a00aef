use crate::error::{validate_pid, Error, Result};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use std::time::Duration;
use tokio::process::Child;

/// How long to wait for the kernel to reap a process after SIGKILL.
const REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// A spawned child we are responsible for killing: mongod or its watchdog.
#[derive(Debug)]
pub struct ManagedProcess {
    /// Human-readable role used in logs and errors ("mongod", "watchdog").
    role: &'static str,
    pid: u32,
    child: Child,
}

impl ManagedProcess {
    /// Wrap a freshly spawned child. Fails if the child has no PID, which
    /// only happens when it already exited and was reaped.
    pub fn new(role: &'static str, child: Child) -> Result<Self> {
        let pid = child.id().ok_or_else(|| {
            Error::InvalidPid {
                pid: 0,
                reason: format!("{} exited before its PID could be read", role),
            }
        })?;
        Ok(Self { role, pid, child })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn role(&self) -> &'static str {
        self.role
    }

    /// Returns true if the child has not exited yet.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// SIGKILL the process and reap it.
    ///
    /// A process that already exited is not an error.
    pub async fn kill(&mut self) -> Result<()> {
        if let Ok(Some(status)) = self.child.try_wait() {
            tracing::debug!("{} (PID {}) already exited: {}", self.role, self.pid, status);
            return Ok(());
        }

        let pid = validate_pid(self.pid, self.role)?;
        match signal::kill(pid, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => {
                return Err(Error::Io(std::io::Error::other(format!(
                    "failed to kill {} (PID {}): {}",
                    self.role, self.pid, e
                ))))
            }
        }

        match tokio::time::timeout(REAP_TIMEOUT, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!("{} (PID {}) exited: {}", self.role, self.pid, status);
                Ok(())
            }
            Ok(Err(e)) => Err(Error::Io(e)),
            Err(_) => Err(Error::Io(std::io::Error::other(format!(
                "{} (PID {}) did not exit within {:?} after SIGKILL",
                self.role, self.pid, REAP_TIMEOUT
            )))),
        }
    }

    /// Best-effort kill used while unwinding a failed startup.
    pub(crate) async fn kill_logged(&mut self) {
        if let Err(e) = self.kill().await {
            tracing::warn!("error stopping {} process: {}", self.role, e);
        }
    }

    /// Wait for the process to exit on its own.
    pub async fn wait(&mut self) -> Result<std::process::ExitStatus> {
        Ok(self.child.wait().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command;

    fn spawn_sleep() -> ManagedProcess {
        let child = Command::new("sleep").arg("60").spawn().unwrap();
        ManagedProcess::new("sleeper", child).unwrap()
    }

    #[tokio::test]
    async fn test_kill_running_process() {
        let mut process = spawn_sleep();
        assert!(process.is_running());
        process.kill().await.unwrap();
        assert!(!process.is_running());
    }

    #[tokio::test]
    async fn test_kill_twice_is_ok() {
        let mut process = spawn_sleep();
        process.kill().await.unwrap();
        process.kill().await.unwrap();
    }

    #[tokio::test]
    async fn test_kill_after_natural_exit() {
        let child = Command::new("true").spawn().unwrap();
        let mut process = ManagedProcess::new("short", child).unwrap();
        process.wait().await.unwrap();
        process.kill().await.unwrap();
    }
}

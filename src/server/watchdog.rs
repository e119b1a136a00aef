//! Out-of-process reaper for mongod.
//!
//! The watchdog is a separate process that knows two PIDs: ours (the parent)
//! and mongod's. Once the parent is gone it SIGKILLs mongod, so a crashed
//! test binary never leaves a server reparented under init. It lives in its
//! own process group so that a Ctrl-C delivered to the test runner's group
//! does not take it down before it has done its job.
//!
//! Graceful teardown does not rely on it: `MongoServer::stop` kills mongod
//! and the watchdog directly.

use super::process::ManagedProcess;
use crate::config::{format_duration, WatchdogSettings};
use crate::error::{validate_pid, Error, Result};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Shell loop run by the default watchdog.
pub fn watchdog_script(parent: u32, child: u32, interval: Duration) -> String {
    let interval = interval.max(MIN_INTERVAL).as_secs_f64();
    format!(
        "while kill -0 {parent} 2>/dev/null; do \
           kill -0 {child} 2>/dev/null || exit 0; \
           sleep {interval}; \
         done; \
         kill -9 {child} 2>/dev/null; \
         exit 0"
    )
}

/// Spawn a watchdog for `server_pid` on behalf of `parent_pid`.
pub fn spawn_watchdog(
    settings: &WatchdogSettings,
    parent_pid: u32,
    server_pid: u32,
) -> Result<ManagedProcess> {
    validate_pid(parent_pid, "watchdog parent")?;
    validate_pid(server_pid, "mongod")?;

    let mut cmd = match settings.program {
        Some(ref program) => {
            let mut cmd = Command::new(program);
            cmd.arg("watchdog")
                .arg("--parent")
                .arg(parent_pid.to_string())
                .arg("--child")
                .arg(server_pid.to_string())
                .arg("--interval")
                .arg(format_duration(settings.interval));
            cmd
        }
        None => {
            let mut cmd = Command::new("/bin/sh");
            cmd.arg("-c")
                .arg(watchdog_script(parent_pid, server_pid, settings.interval));
            cmd
        }
    };

    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(false)
        .process_group(0);

    let child = cmd
        .spawn()
        .map_err(|e| Error::Watchdog(format!("failed to spawn watchdog: {}", e)))?;
    let process = ManagedProcess::new("watchdog", child)?;

    tracing::debug!(
        "Started watchdog (PID {}) for mongod PID {} on behalf of PID {}",
        process.pid(),
        server_pid,
        parent_pid
    );
    Ok(process)
}

/// How a native [`supervise`] loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperviseExit {
    /// The parent disappeared and the child was sent SIGKILL.
    ChildKilled,
    /// The child exited on its own while the parent was still alive.
    ChildExited,
}

/// Native equivalent of [`watchdog_script`], used by `memongo watchdog`.
pub async fn supervise(parent: Pid, child: Pid, interval: Duration) -> SuperviseExit {
    let interval = interval.max(MIN_INTERVAL);
    loop {
        if !process_exists(parent) {
            tracing::info!(
                "Parent PID {} is gone; killing PID {}",
                parent.as_raw(),
                child.as_raw()
            );
            if let Err(e) = signal::kill(child, Signal::SIGKILL) {
                tracing::debug!("kill({}) failed: {}", child.as_raw(), e);
            }
            return SuperviseExit::ChildKilled;
        }
        if !process_exists(child) {
            return SuperviseExit::ChildExited;
        }
        tokio::time::sleep(interval).await;
    }
}

/// Existence check that treats EPERM as "exists".
fn process_exists(pid: Pid) -> bool {
    !matches!(signal::kill(pid, None), Err(Errno::ESRCH))
}

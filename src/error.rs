// Allow unused_assignments at module level because thiserror's generated code
// for struct variants triggers false positive warnings - the fields ARE used
// in the Display impl but rustc's lint pass doesn't see this.
#![allow(unused_assignments)]

use crate::docker::DockerError;
use crate::output::StartupFailure;
use miette::Diagnostic;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(memongo::config::invalid),
        help("Check the options passed to start_with_options or your memongo.yaml")
    )]
    Config(String),

    #[error("Could not find a mongod binary for version '{version}': {reason}")]
    #[diagnostic(
        code(memongo::binary::not_found),
        help("Set MEMONGO_MONGOD_BIN to a mongod executable, or put mongod on your PATH")
    )]
    BinaryNotFound { version: String, reason: String },

    #[error("Failed to launch '{}': {source}", .binary.display())]
    #[diagnostic(
        code(memongo::process::launch),
        help("Check that the binary exists and is executable")
    )]
    Launch {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Mongod startup failed, {0}")]
    #[diagnostic(
        code(memongo::startup::failed),
        help("Run with RUST_LOG=memongo=debug to see the full mongod output")
    )]
    Startup(StartupFailure),

    #[error("Timed out waiting for mongod to start (waited {}s)", .0.as_secs())]
    #[diagnostic(
        code(memongo::startup::timeout),
        help("Cold starts can be slow; raise startup_timeout or set MEMONGO_STARTUP_TIMEOUT")
    )]
    Timeout(Duration),

    #[error("Failed to start watchdog: {0}")]
    #[diagnostic(code(memongo::watchdog::failed))]
    Watchdog(String),

    #[error("Failed to initiate replica set: {0}")]
    #[diagnostic(
        code(memongo::replica::initiate),
        help("Replica mode needs the mongosh (or legacy mongo) shell on your PATH")
    )]
    ReplicaInitiation(String),

    #[error("Docker error: {0}")]
    #[diagnostic(
        code(memongo::docker::error),
        help("Check that Docker is running with `docker ps`")
    )]
    Docker(#[from] DockerError),

    #[error("Storage directory error at '{}': {source}", .path.display())]
    #[diagnostic(code(memongo::storage::error))]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid PID {pid}: {reason}")]
    InvalidPid { pid: u32, reason: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Multiple errors occurred:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Multiple(Vec<Error>),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns a helpful suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Error::Startup(StartupFailure::AddressInUse) => Some(
                "Another process holds the requested port. Use port 0 to let memongo pick a free one."
                    .to_string(),
            ),
            Error::Startup(StartupFailure::AlreadyRunning) => Some(
                "A mongod already owns this data directory. Stop the other instance first."
                    .to_string(),
            ),
            Error::Startup(StartupFailure::ExitedBeforeReady) => Some(
                "mongod exited early. Recent MongoDB releases dropped ephemeralForTest; try the durable engine."
                    .to_string(),
            ),
            Error::Timeout(_) => Some(
                "Increase the startup timeout, e.g. MEMONGO_STARTUP_TIMEOUT=60s".to_string(),
            ),
            Error::BinaryNotFound { version, .. } => Some(format!(
                "Install mongod {} locally and point MEMONGO_MONGOD_BIN at it",
                version
            )),
            Error::ReplicaInitiation(_) => {
                Some("Install mongosh or set MEMONGO_MONGO_SHELL".to_string())
            }
            Error::Docker(_) => Some("Check that Docker is running: docker ps".to_string()),
            _ => None,
        }
    }

    /// Formats the error with its suggestion (if any) for user-friendly display.
    pub fn with_suggestion(&self) -> String {
        match self.suggestion() {
            Some(suggestion) => format!("{}\n\nHint: {}", self, suggestion),
            None => self.to_string(),
        }
    }
}

/// Validates and converts a u32 PID to nix::unistd::Pid safely.
/// Returns Err for PID 0 (process group), PID 1 (init), or values > i32::MAX.
pub fn validate_pid(pid: u32, what: &str) -> Result<nix::unistd::Pid> {
    if pid == 0 {
        return Err(Error::InvalidPid {
            pid,
            reason: format!("PID 0 is invalid for {} (refers to process group)", what),
        });
    }
    if pid == 1 {
        return Err(Error::InvalidPid {
            pid,
            reason: format!("refusing to signal PID 1 (init) for {}", what),
        });
    }
    if pid > i32::MAX as u32 {
        return Err(Error::InvalidPid {
            pid,
            reason: format!("PID exceeds i32::MAX for {}", what),
        });
    }
    Ok(nix::unistd::Pid::from_raw(pid as i32))
}

/// Returns true if a process with this PID exists (zombies included).
pub fn is_pid_alive(pid: u32) -> bool {
    if pid == 0 || pid > i32::MAX as u32 {
        return false;
    }
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_pid_rejects_zero_and_init() {
        assert!(validate_pid(0, "mongod").is_err());
        assert!(validate_pid(1, "mongod").is_err());
    }

    #[test]
    fn validate_pid_rejects_overflow() {
        let err = validate_pid(i32::MAX as u32 + 1, "mongod").unwrap_err();
        assert!(err.to_string().contains("i32::MAX"));
    }

    #[test]
    fn validate_pid_accepts_max() {
        let pid = validate_pid(i32::MAX as u32, "mongod").unwrap();
        assert_eq!(pid.as_raw(), i32::MAX);
    }

    #[test]
    fn own_pid_is_alive() {
        assert!(is_pid_alive(std::process::id()));
        assert!(!is_pid_alive(0));
    }

    #[test]
    fn startup_error_mentions_reason() {
        let err = Error::Startup(StartupFailure::AddressInUse);
        assert_eq!(err.to_string(), "Mongod startup failed, address in use");
        assert!(err.with_suggestion().contains("Hint:"));
    }

    #[test]
    fn timeout_error_message() {
        let err = Error::Timeout(Duration::from_secs(30));
        assert_eq!(
            err.to_string(),
            "Timed out waiting for mongod to start (waited 30s)"
        );
    }

    #[test]
    fn multiple_lists_each_error() {
        let err = Error::Multiple(vec![
            Error::Watchdog("gone".to_string()),
            Error::Config("bad".to_string()),
        ]);
        let text = err.to_string();
        assert!(text.contains("  - Failed to start watchdog: gone"));
        assert!(text.contains("  - Configuration error: bad"));
    }
}

//! Handling of mongod's diagnostic output.
//!
//! - [`classifier`] scans stdout for the readiness line (or a known failure)
//!   and reports a single [`StartupOutcome`].
//! - [`relay`] forwards stderr without looking at it.
//! - [`sink`] is where every line ends up.

mod classifier;
mod lines;
mod patterns;
mod relay;
mod sink;

pub use classifier::*;
pub use patterns::*;
pub use relay::*;
pub use sink::*;

use std::fmt;

/// Terminal result of the startup race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupOutcome {
    /// mongod reported it is accepting connections on `port`.
    Ready { port: u16 },
    /// mongod reported (or exhibited) a known failure.
    Failed(StartupFailure),
    /// Nothing conclusive arrived before the deadline.
    TimedOut,
}

/// Why mongod failed to come up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupFailure {
    AddressInUse,
    AlreadyRunning,
    PermissionDenied,
    DataDirectoryNotFound,
    ShuttingDown,
    /// The readiness line matched but its port did not fit in a `u16`.
    UnparseablePort { line: String },
    /// stdout closed before any classification.
    ExitedBeforeReady,
}

impl fmt::Display for StartupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupFailure::AddressInUse => write!(f, "address in use"),
            StartupFailure::AlreadyRunning => write!(f, "already running"),
            StartupFailure::PermissionDenied => write!(f, "permission denied"),
            StartupFailure::DataDirectoryNotFound => write!(f, "data directory not found"),
            StartupFailure::ShuttingDown => write!(f, "server shut down"),
            StartupFailure::UnparseablePort { line } => {
                write!(f, "could not parse port from log line: {}", line)
            }
            StartupFailure::ExitedBeforeReady => {
                write!(f, "process exited before startup completed")
            }
        }
    }
}

/// Which of mongod's output streams a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
    /// Output of the mongo shell during replica set initiation.
    Shell,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdout => write!(f, "stdout"),
            Stream::Stderr => write!(f, "stderr"),
            Stream::Shell => write!(f, "shell"),
        }
    }
}

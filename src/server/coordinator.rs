//! The startup race: first of {classifier outcome, deadline}.

use super::process::ManagedProcess;
use super::storage::StorageDir;
use crate::error::{Error, Result};
use crate::output::{StartupFailure, StartupOutcome};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// Wait for the classifier's outcome or the deadline, whichever comes first.
///
/// The receiver is consumed either way; if the deadline wins it is dropped,
/// and the classifier's later send simply fails without blocking. A sender
/// dropped without sending counts as the process having exited.
pub async fn await_startup(
    outcome: oneshot::Receiver<StartupOutcome>,
    timeout: Duration,
) -> StartupOutcome {
    let started = Instant::now();
    let result = match tokio::time::timeout(timeout, outcome).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(_)) => StartupOutcome::Failed(StartupFailure::ExitedBeforeReady),
        Err(_) => StartupOutcome::TimedOut,
    };
    tracing::debug!("startup outcome {:?} after {:?}", result, started.elapsed());
    result
}

/// Map a startup outcome to the port or the error surfaced to the caller.
pub fn outcome_into_result(outcome: StartupOutcome, timeout: Duration) -> Result<u16> {
    match outcome {
        StartupOutcome::Ready { port } => Ok(port),
        StartupOutcome::Failed(reason) => Err(Error::Startup(reason)),
        StartupOutcome::TimedOut => Err(Error::Timeout(timeout)),
    }
}

/// Release everything a failed startup acquired.
///
/// Each step is attempted regardless of the others and failures are only
/// logged: the caller returns its original startup error.
pub async fn unwind(
    server: &mut ManagedProcess,
    watchdog: Option<&mut ManagedProcess>,
    storage: &mut StorageDir,
) {
    server.kill_logged().await;
    if let Some(watchdog) = watchdog {
        watchdog.kill_logged().await;
    }
    storage.remove_logged();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command;

    #[tokio::test]
    async fn test_outcome_before_deadline() {
        let (tx, rx) = oneshot::channel();
        tx.send(StartupOutcome::Ready { port: 27018 }).unwrap();
        let outcome = await_startup(rx, Duration::from_secs(5)).await;
        assert_eq!(outcome, StartupOutcome::Ready { port: 27018 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_wins() {
        let (tx, rx) = oneshot::channel::<StartupOutcome>();
        let outcome = await_startup(rx, Duration::from_secs(30)).await;
        assert_eq!(outcome, StartupOutcome::TimedOut);

        // The classifier may still try to report; that must not block or panic.
        assert!(tx.send(StartupOutcome::Ready { port: 1 }).is_err());
    }

    #[tokio::test]
    async fn test_closed_channel_is_exit() {
        let (tx, rx) = oneshot::channel::<StartupOutcome>();
        drop(tx);
        let outcome = await_startup(rx, Duration::from_secs(5)).await;
        assert_eq!(
            outcome,
            StartupOutcome::Failed(StartupFailure::ExitedBeforeReady)
        );
    }

    #[test]
    fn test_outcome_mapping() {
        let timeout = Duration::from_secs(30);
        assert_eq!(
            outcome_into_result(StartupOutcome::Ready { port: 5 }, timeout).unwrap(),
            5
        );
        assert!(matches!(
            outcome_into_result(
                StartupOutcome::Failed(StartupFailure::AddressInUse),
                timeout
            ),
            Err(Error::Startup(StartupFailure::AddressInUse))
        ));
        assert!(matches!(
            outcome_into_result(StartupOutcome::TimedOut, timeout),
            Err(Error::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_unwind_releases_everything() {
        let child = Command::new("sleep").arg("60").spawn().unwrap();
        let mut server = ManagedProcess::new("mongod", child).unwrap();
        let mut storage = StorageDir::create().unwrap();
        let path = storage.path().to_path_buf();

        unwind(&mut server, None, &mut storage).await;

        assert!(!server.is_running());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unwind_continues_after_storage_already_gone() {
        let child = Command::new("sleep").arg("60").spawn().unwrap();
        let mut server = ManagedProcess::new("mongod", child).unwrap();
        let watchdog_child = Command::new("sleep").arg("60").spawn().unwrap();
        let mut watchdog = ManagedProcess::new("watchdog", watchdog_child).unwrap();
        let mut storage = StorageDir::create().unwrap();
        std::fs::remove_dir_all(storage.path()).unwrap();

        unwind(&mut server, Some(&mut watchdog), &mut storage).await;

        assert!(!server.is_running());
        assert!(!watchdog.is_running());
    }
}

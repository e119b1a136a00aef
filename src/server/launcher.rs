use super::process::ManagedProcess;
use super::storage::StorageDir;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{OutputClassifier, StartupOutcome, StderrRelay};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::oneshot;

/// A mongod process that has been spawned but not yet classified.
pub struct Launched {
    pub process: ManagedProcess,
    pub classifier: OutputClassifier,
    pub relay: StderrRelay,
    pub outcome: oneshot::Receiver<StartupOutcome>,
}

/// Command-line arguments for mongod.
pub fn mongod_args(config: &Config, db_path: &Path) -> Vec<String> {
    let mut args = vec![
        "--storageEngine".to_string(),
        config.storage_engine.as_arg().to_string(),
        "--dbpath".to_string(),
        db_path.to_string_lossy().into_owned(),
        "--port".to_string(),
        config.port.to_string(),
    ];
    if let Some(ref replica) = config.replica {
        args.extend([
            "--replSet".to_string(),
            replica.set_name.clone(),
            "--bind_ip".to_string(),
            "localhost".to_string(),
        ]);
    }
    args
}

/// Spawn mongod with stdout wired to a classifier and stderr to a relay.
///
/// If the spawn fails, the storage directory is removed before the error is
/// returned since no process is left to clean up after.
pub async fn launch(
    binary: &Path,
    config: &Config,
    storage: &mut StorageDir,
) -> Result<Launched> {
    let args = mongod_args(config, storage.path());
    tracing::debug!("Starting {} {}", binary.display(), args.join(" "));

    let mut cmd = Command::new(binary);
    cmd.args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(false);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::error!("Failed to spawn {}: {}", binary.display(), e);
            storage.remove_logged();
            return Err(Error::Launch {
                binary: binary.to_path_buf(),
                source: e,
            });
        }
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let mut process = match ManagedProcess::new("mongod", child) {
        Ok(process) => process,
        Err(e) => {
            storage.remove_logged();
            return Err(e);
        }
    };

    let (Some(stdout), Some(stderr)) = (stdout, stderr) else {
        // Both were configured as piped, so this should not happen.
        let err = Error::Launch {
            binary: binary.to_path_buf(),
            source: std::io::Error::other("mongod output streams were not captured"),
        };
        process.kill_logged().await;
        storage.remove_logged();
        return Err(err);
    };

    let (classifier, outcome) =
        OutputClassifier::spawn(stdout, config.name.clone(), config.sink.clone());
    let relay = StderrRelay::spawn(stderr, config.name.clone(), config.sink.clone());

    tracing::debug!("Started mongod (PID {})", process.pid());

    Ok(Launched {
        process,
        classifier,
        relay,
        outcome,
    })
}

use crate::binary::find_on_path;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::Stream;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const INITIATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Initiate, then block until this node has become primary so the caller can
/// write immediately. `db.isMaster()` exists in both mongosh and the legacy shell.
const INITIATE_SCRIPT: &str = "rs.initiate(); while (!db.isMaster().ismaster) { sleep(100); }";

/// Pick the shell used for `rs.initiate()`.
fn shell_program(config: &Config) -> Result<PathBuf> {
    if let Some(ref shell) = config.mongo_shell {
        return Ok(shell.clone());
    }
    find_on_path("mongosh")
        .or_else(|| find_on_path("mongo"))
        .ok_or_else(|| {
            Error::ReplicaInitiation("neither mongosh nor mongo was found on PATH".to_string())
        })
}

/// Arguments for the shell invocation.
pub fn initiate_args(port: u16) -> Vec<String> {
    vec![
        "--port".to_string(),
        port.to_string(),
        "--quiet".to_string(),
        "--eval".to_string(),
        INITIATE_SCRIPT.to_string(),
    ]
}

/// Turn the freshly started mongod on `port` into a one-node replica set.
///
/// Runs once; any failure is returned as [`Error::ReplicaInitiation`].
pub async fn initiate_replica_set(config: &Config, port: u16) -> Result<()> {
    let shell = shell_program(config)?;
    tracing::debug!("Initiating replica set via {} on port {}", shell.display(), port);

    let output = tokio::time::timeout(
        INITIATE_TIMEOUT,
        Command::new(&shell)
            .args(initiate_args(port))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| {
        Error::ReplicaInitiation(format!(
            "{} did not finish within {}s",
            shell.display(),
            INITIATE_TIMEOUT.as_secs()
        ))
    })?
    .map_err(|e| Error::ReplicaInitiation(format!("failed to run {}: {}", shell.display(), e)))?;

    for line in String::from_utf8_lossy(&output.stdout)
        .lines()
        .chain(String::from_utf8_lossy(&output.stderr).lines())
    {
        config.sink.line(&config.name, Stream::Shell, line);
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(Error::ReplicaInitiation(format!(
            "{} exited with {}: {}",
            shell.display(),
            output.status,
            stderr
        )));
    }

    tracing::debug!("Started mongo replica set on port {}", port);
    Ok(())
}

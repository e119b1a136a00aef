use super::process::ManagedProcess;
use super::storage::StorageDir;
use crate::docker::DockerClient;
use crate::error::{Error, Result};
use crate::output::{OutputClassifier, StderrRelay};
use crate::random::random_database;
use std::path::Path;

/// Background tasks reading mongod's stdout and stderr.
pub(crate) struct OutputTasks {
    pub classifier: OutputClassifier,
    pub relay: StderrRelay,
}

impl OutputTasks {
    /// Both tasks end on their own once the process is gone and its pipes
    /// close; this only cuts off stragglers.
    fn abort(self) {
        if !self.classifier.is_finished() {
            self.classifier.abort();
        }
        if !self.relay.is_finished() {
            self.relay.abort();
        }
    }
}

enum Backend {
    Process {
        server: Option<ManagedProcess>,
        watchdog: Option<ManagedProcess>,
        storage: StorageDir,
        output: Option<OutputTasks>,
    },
    Container {
        id: Option<String>,
        client: DockerClient,
    },
}

/// A running MongoDB server.
///
/// Returned only once the server has reported that it accepts connections.
/// Dropping the handle does not stop anything: call [`MongoServer::stop`].
/// If the owning process dies without doing so, the watchdog kills mongod,
/// but the data directory is left behind.
pub struct MongoServer {
    port: u16,
    name: String,
    backend: Backend,
}

impl MongoServer {
    pub(crate) fn from_process(
        name: String,
        port: u16,
        server: ManagedProcess,
        watchdog: ManagedProcess,
        storage: StorageDir,
        output: OutputTasks,
    ) -> Self {
        Self {
            port,
            name,
            backend: Backend::Process {
                server: Some(server),
                watchdog: Some(watchdog),
                storage,
                output: Some(output),
            },
        }
    }

    pub(crate) fn from_container(
        name: String,
        port: u16,
        id: String,
        client: DockerClient,
    ) -> Self {
        Self {
            port,
            name,
            backend: Backend::Container {
                id: Some(id),
                client,
            },
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Connection string for the server, e.g. `mongodb://localhost:27018`.
    pub fn uri(&self) -> String {
        format!("mongodb://localhost:{}", self.port)
    }

    /// [`MongoServer::uri`] with a fresh random database name appended.
    pub fn uri_with_random_db(&self) -> String {
        format!("{}/{}", self.uri(), random_database())
    }

    /// PID of the local mongod process, until it has been stopped.
    pub fn pid(&self) -> Option<u32> {
        match self.backend {
            Backend::Process { ref server, .. } => server.as_ref().map(ManagedProcess::pid),
            Backend::Container { .. } => None,
        }
    }

    /// PID of the watchdog, until it has been stopped.
    pub fn watchdog_pid(&self) -> Option<u32> {
        match self.backend {
            Backend::Process { ref watchdog, .. } => watchdog.as_ref().map(ManagedProcess::pid),
            Backend::Container { .. } => None,
        }
    }

    /// The `--dbpath` directory of a local server.
    pub fn db_path(&self) -> Option<&Path> {
        match self.backend {
            Backend::Process { ref storage, .. } => Some(storage.path()),
            Backend::Container { .. } => None,
        }
    }

    pub fn container_id(&self) -> Option<&str> {
        match self.backend {
            Backend::Process { .. } => None,
            Backend::Container { ref id, .. } => id.as_deref(),
        }
    }

    /// Kill mongod, kill the watchdog, and delete the data directory.
    ///
    /// Every step runs even if an earlier one fails. Failures are logged and
    /// returned together as [`Error::Multiple`]. Calling `stop` again after
    /// it has run is a no-op.
    pub async fn stop(&mut self) -> Result<()> {
        let mut errors = Vec::new();

        match self.backend {
            Backend::Process {
                ref mut server,
                ref mut watchdog,
                ref mut storage,
                ref mut output,
            } => {
                if let Some(mut process) = server.take() {
                    if let Err(e) = process.kill().await {
                        tracing::warn!("error stopping {} process: {}", self.name, e);
                        errors.push(e);
                    }
                }
                if let Some(mut process) = watchdog.take() {
                    if let Err(e) = process.kill().await {
                        tracing::warn!("error stopping watchdog process: {}", e);
                        errors.push(e);
                    }
                }
                if let Err(e) = storage.remove() {
                    tracing::warn!("error removing data directory: {}", e);
                    errors.push(e);
                }
                if let Some(tasks) = output.take() {
                    tasks.abort();
                }
            }
            Backend::Container {
                ref mut id,
                ref client,
            } => {
                if let Some(container) = id.take() {
                    if let Err(e) = client.rm_force(&container).await {
                        tracing::warn!("error removing container {}: {}", container, e);
                        errors.push(Error::Docker(e));
                    }
                }
            }
        }

        match errors.len() {
            0 => {
                tracing::debug!("Stopped {} on port {}", self.name, self.port);
                Ok(())
            }
            1 => Err(errors.remove(0)),
            _ => Err(Error::Multiple(errors)),
        }
    }
}

impl std::fmt::Debug for MongoServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoServer")
            .field("name", &self.name)
            .field("port", &self.port)
            .field("pid", &self.pid())
            .field("db_path", &self.db_path())
            .field("container_id", &self.container_id())
            .finish()
    }
}

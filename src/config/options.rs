use super::duration::{deserialize_opt_duration, parse_duration_string};
use crate::error::{Error, Result};
use crate::output::{LogSink, SinkRef};
use serde::Deserialize;
use std::fmt;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Startup timeout used when neither the options nor the environment set one.
/// Cold starts of a freshly unpacked mongod can take a while.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

/// How often the watchdog checks whether its parent is still alive.
pub const DEFAULT_WATCHDOG_INTERVAL: Duration = Duration::from_secs(1);

/// Fixed wait after `docker run` before the container is assumed ready.
pub const DEFAULT_CONTAINER_STARTUP_DELAY: Duration = Duration::from_secs(3);

pub const DEFAULT_REPLICA_SET_NAME: &str = "rs0";

pub const ENV_MONGOD_BIN: &str = "MEMONGO_MONGOD_BIN";
pub const ENV_CACHE_PATH: &str = "MEMONGO_CACHE_PATH";
pub const ENV_STARTUP_TIMEOUT: &str = "MEMONGO_STARTUP_TIMEOUT";
pub const ENV_MONGO_SHELL: &str = "MEMONGO_MONGO_SHELL";

/// mongod storage engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageEngine {
    /// Non-durable engine for disposable instances (`ephemeralForTest`).
    Ephemeral,
    /// Regular on-disk engine (`wiredTiger`). Required for replica sets.
    Durable,
}

impl StorageEngine {
    /// Value passed to `--storageEngine`.
    pub fn as_arg(&self) -> &'static str {
        match self {
            StorageEngine::Ephemeral => "ephemeralForTest",
            StorageEngine::Durable => "wiredTiger",
        }
    }
}

impl fmt::Display for StorageEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// Partially specified startup request.
///
/// Anything left unset is filled in by [`Options::resolve`]. Options can be
/// built in code or loaded from YAML:
///
/// ```yaml
/// mongo_version: "6.0"
/// port: 27018
/// use_replica: true
/// startup_timeout: 45s
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    pub mongo_version: String,
    /// 0 picks a free port.
    pub port: u16,
    pub storage_engine: Option<StorageEngine>,
    pub use_replica: bool,
    pub replica_set_name: Option<String>,
    /// Launch through docker instead of a local binary.
    pub use_container: bool,
    #[serde(deserialize_with = "deserialize_opt_duration")]
    pub startup_timeout: Option<Duration>,
    /// Explicit mongod executable; skips binary resolution.
    pub binary_path: Option<PathBuf>,
    /// Root of the per-version binary cache.
    pub cache_path: Option<PathBuf>,
    /// Program used for `rs.initiate()` (mongosh or mongo).
    pub mongo_shell: Option<PathBuf>,
    /// Executable providing a `watchdog` subcommand; the default is a shell loop.
    pub watchdog_program: Option<PathBuf>,
    #[serde(deserialize_with = "deserialize_opt_duration")]
    pub watchdog_interval: Option<Duration>,
    #[serde(deserialize_with = "deserialize_opt_duration")]
    pub container_startup_delay: Option<Duration>,
    /// docker-compatible CLI used in container mode.
    pub docker_program: Option<PathBuf>,
    /// Label attached to every relayed log line.
    pub name: Option<String>,
    #[serde(skip)]
    pub sink: SinkRef,
}

impl Options {
    pub fn new(mongo_version: impl Into<String>) -> Self {
        Self {
            mongo_version: mongo_version.into(),
            ..Self::default()
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn storage_engine(mut self, engine: StorageEngine) -> Self {
        self.storage_engine = Some(engine);
        self
    }

    pub fn replica(mut self, enabled: bool) -> Self {
        self.use_replica = enabled;
        self
    }

    pub fn container(mut self, enabled: bool) -> Self {
        self.use_container = enabled;
        self
    }

    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = Some(timeout);
        self
    }

    pub fn binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = Some(path.into());
        self
    }

    pub fn mongo_shell(mut self, path: impl Into<PathBuf>) -> Self {
        self.mongo_shell = Some(path.into());
        self
    }

    pub fn watchdog_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.watchdog_program = Some(program.into());
        self
    }

    pub fn watchdog_interval(mut self, interval: Duration) -> Self {
        self.watchdog_interval = Some(interval);
        self
    }

    pub fn container_startup_delay(mut self, delay: Duration) -> Self {
        self.container_startup_delay = Some(delay);
        self
    }

    pub fn docker_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.docker_program = Some(program.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sink = SinkRef::new(sink);
        self
    }

    /// Parse options from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load options from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Fill in defaults, apply environment overrides, and validate.
    pub fn resolve(self) -> Result<Config> {
        self.resolve_with_env(|key| std::env::var(key).ok())
    }

    /// Like [`Options::resolve`], reading environment variables through `env`.
    pub fn resolve_with_env(self, env: impl Fn(&str) -> Option<String>) -> Result<Config> {
        if self.use_replica && self.use_container {
            return Err(Error::Config(
                "replica mode and container mode cannot be used together".to_string(),
            ));
        }

        let storage_engine = match (self.storage_engine, self.use_replica) {
            (Some(StorageEngine::Ephemeral), true) => {
                return Err(Error::Config(
                    "replica mode requires the durable storage engine".to_string(),
                ));
            }
            (Some(engine), _) => engine,
            (None, true) => StorageEngine::Durable,
            (None, false) => StorageEngine::Ephemeral,
        };

        let binary_path = self
            .binary_path
            .or_else(|| env(ENV_MONGOD_BIN).filter(|s| !s.is_empty()).map(PathBuf::from));

        if self.mongo_version.trim().is_empty() {
            if self.use_container {
                return Err(Error::Config(
                    "mongo_version is required in container mode".to_string(),
                ));
            }
            if binary_path.is_none() {
                return Err(Error::Config(format!(
                    "one of mongo_version or binary_path (or {}) must be set",
                    ENV_MONGOD_BIN
                )));
            }
        }

        let startup_timeout = match self.startup_timeout {
            Some(timeout) => timeout,
            None => match env(ENV_STARTUP_TIMEOUT) {
                Some(raw) => parse_duration_string(&raw).ok_or_else(|| {
                    Error::Config(format!("invalid {} value '{}'", ENV_STARTUP_TIMEOUT, raw))
                })?,
                None => DEFAULT_STARTUP_TIMEOUT,
            },
        };
        if startup_timeout.is_zero() {
            return Err(Error::Config("startup_timeout must be positive".to_string()));
        }

        let port = if self.port == 0 {
            allocate_free_port()?
        } else {
            self.port
        };

        let cache_path = self
            .cache_path
            .or_else(|| env(ENV_CACHE_PATH).filter(|s| !s.is_empty()).map(PathBuf::from))
            .unwrap_or_else(default_cache_path);

        let mongo_shell = self
            .mongo_shell
            .or_else(|| env(ENV_MONGO_SHELL).filter(|s| !s.is_empty()).map(PathBuf::from));

        let replica = self.use_replica.then(|| ReplicaSettings {
            set_name: self
                .replica_set_name
                .unwrap_or_else(|| DEFAULT_REPLICA_SET_NAME.to_string()),
        });

        Ok(Config {
            version: self.mongo_version.trim().to_string(),
            port,
            storage_engine,
            replica,
            container: self.use_container,
            startup_timeout,
            binary_path,
            cache_path,
            mongo_shell,
            watchdog: WatchdogSettings {
                program: self.watchdog_program,
                interval: self.watchdog_interval.unwrap_or(DEFAULT_WATCHDOG_INTERVAL),
            },
            container_startup_delay: self
                .container_startup_delay
                .unwrap_or(DEFAULT_CONTAINER_STARTUP_DELAY),
            docker_program: self
                .docker_program
                .unwrap_or_else(|| PathBuf::from("docker")),
            name: self.name.unwrap_or_else(|| "mongod".to_string()),
            sink: self.sink,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaSettings {
    pub set_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchdogSettings {
    pub program: Option<PathBuf>,
    pub interval: Duration,
}

/// Fully resolved, immutable configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub version: String,
    pub port: u16,
    pub storage_engine: StorageEngine,
    /// Present only in replica mode.
    pub replica: Option<ReplicaSettings>,
    pub container: bool,
    pub startup_timeout: Duration,
    pub binary_path: Option<PathBuf>,
    pub cache_path: PathBuf,
    pub mongo_shell: Option<PathBuf>,
    pub watchdog: WatchdogSettings,
    pub container_startup_delay: Duration,
    pub docker_program: PathBuf,
    pub name: String,
    pub sink: SinkRef,
}

impl Config {
    pub fn is_replica(&self) -> bool {
        self.replica.is_some()
    }
}

/// Default root of the binary cache: `<user cache dir>/memongo`.
pub fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("memongo")
}

/// Ask the OS for a free TCP port on localhost.
///
/// The listener is dropped before returning, so there is a short window in
/// which another process could take the port. mongod then reports
/// "addr already in use" and startup fails cleanly.
pub fn allocate_free_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|e| Error::Config(format!("Failed to bind to a random port: {}", e)))?;
    let port = listener
        .local_addr()
        .map_err(|e| Error::Config(format!("Failed to get local address: {}", e)))?
        .port();
    Ok(port)
}

//! Starting and stopping mongod.
//!
//! [`start_with_options`] runs the whole sequence: resolve the config, find a
//! binary, create a data directory, launch mongod, attach a watchdog, wait
//! for the readiness line, and initiate the replica set when asked to. Any
//! failure along the way releases whatever was acquired before it and
//! returns the original error.

mod container;
mod coordinator;
mod handle;
mod launcher;
mod process;
mod replica;
mod storage;
mod watchdog;

pub use container::{start_container, start_container_with_options};
pub use coordinator::{await_startup, outcome_into_result};
pub use handle::MongoServer;
pub use launcher::{launch, mongod_args, Launched};
pub use process::ManagedProcess;
pub use replica::{initiate_args, initiate_replica_set};
pub use storage::StorageDir;
pub use watchdog::{spawn_watchdog, supervise, watchdog_script, SuperviseExit};

use crate::binary::{BinaryResolver, LocalResolver};
use crate::config::Options;
use crate::error::Result;
use handle::OutputTasks;

/// Start a mongod of `version` with default options.
pub async fn start(version: &str) -> Result<MongoServer> {
    start_with_options(Options::new(version)).await
}

/// Start a mongod described by `options`.
///
/// With `use_container` set this delegates to [`start_container_with_options`].
pub async fn start_with_options(options: Options) -> Result<MongoServer> {
    start_with_resolver(options, &LocalResolver::new()).await
}

/// Like [`start_with_options`], locating the mongod binary through `resolver`.
pub async fn start_with_resolver(
    options: Options,
    resolver: &dyn BinaryResolver,
) -> Result<MongoServer> {
    let config = options.resolve()?;
    if config.container {
        return container::start_resolved(config).await;
    }

    let binary = resolver.resolve(&config).await?;
    let mut storage = StorageDir::create()?;

    let Launched {
        process: mut server,
        classifier,
        relay,
        outcome,
    } = launch(&binary, &config, &mut storage).await?;
    let output = OutputTasks { classifier, relay };

    let mut watchdog = match spawn_watchdog(&config.watchdog, std::process::id(), server.pid()) {
        Ok(watchdog) => watchdog,
        Err(e) => {
            tracing::error!("Failed to start watchdog for mongod (PID {}): {}", server.pid(), e);
            coordinator::unwind(&mut server, None, &mut storage).await;
            return Err(e);
        }
    };

    let outcome = await_startup(outcome, config.startup_timeout).await;
    let port = match outcome_into_result(outcome, config.startup_timeout) {
        Ok(port) => port,
        Err(e) => {
            tracing::error!("{}", e);
            coordinator::unwind(&mut server, Some(&mut watchdog), &mut storage).await;
            return Err(e);
        }
    };
    if port != config.port {
        tracing::warn!(
            "mongod reported port {} but was asked for {}",
            port,
            config.port
        );
    }

    if config.is_replica() {
        if let Err(e) = initiate_replica_set(&config, port).await {
            tracing::error!("{}", e);
            coordinator::unwind(&mut server, Some(&mut watchdog), &mut storage).await;
            return Err(e);
        }
    }

    tracing::info!(
        "Started {} (PID {}) on port {}",
        config.name,
        server.pid(),
        port
    );

    Ok(MongoServer::from_process(
        config.name,
        port,
        server,
        watchdog,
        storage,
        output,
    ))
}

//! # memongo
//!
//! Throwaway MongoDB servers for test suites.
//!
//! ## Features
//!
//! - **Local mongod**: Launches a mongod binary on a fresh data directory and
//!   waits until it reports that it accepts connections
//! - **Failure detection**: Known startup failures (port taken, bad data
//!   directory, early exit) are reported as typed errors instead of hangs
//! - **Watchdog**: A separate process kills mongod if the test process dies
//!   without stopping it
//! - **Replica sets**: Optional single-node replica set, initiated through
//!   `mongosh` or the legacy `mongo` shell
//! - **Containers**: Optional `mongo:<version>` container via the docker CLI
//!
//! ## Quick Start
//!
//! ```no_run
//! # async fn example() -> Result<(), memongo::Error> {
//! let mut server = memongo::start("6.0").await?;
//! println!("connect to {}", server.uri_with_random_db());
//!
//! // ... run tests against the server ...
//!
//! server.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Options
//!
//! ```no_run
//! use memongo::{Options, StorageEngine};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), memongo::Error> {
//! let options = Options::new("6.0")
//!     .port(27018)
//!     .storage_engine(StorageEngine::Durable)
//!     .replica(true)
//!     .startup_timeout(Duration::from_secs(60));
//! let mut server = memongo::start_with_options(options).await?;
//! server.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment
//!
//! - `MEMONGO_MONGOD_BIN`: mongod executable to use
//! - `MEMONGO_CACHE_PATH`: root of the per-version binary cache
//! - `MEMONGO_STARTUP_TIMEOUT`: startup timeout, e.g. `45s`
//! - `MEMONGO_MONGO_SHELL`: shell used to initiate replica sets

pub mod binary;
pub mod config;
pub mod docker;
pub mod error;
pub mod output;
pub mod random;
pub mod server;

pub use binary::{BinaryResolver, LocalResolver};
pub use config::{Config, Options, StorageEngine};
pub use error::{Error, Result};
pub use output::{LogSink, MemorySink, StartupFailure, StartupOutcome, Stream, TracingSink};
pub use random::random_database;
pub use server::{
    start, start_container, start_container_with_options, start_with_options,
    start_with_resolver, MongoServer,
};

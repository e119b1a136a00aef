use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "memongo")]
#[command(about = "memongo - Throwaway MongoDB servers for tests")]
pub struct Cli {
    /// Options file (YAML); command-line flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a server, print its URI, and stop it on Ctrl-C
    Start {
        /// MongoDB version (e.g. 6.0)
        #[arg(long, value_name = "VERSION")]
        mongo_version: Option<String>,

        /// Port to listen on (defaults to a free port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Run as a single-node replica set
        #[arg(long)]
        replica: bool,

        /// Run in a docker container instead of a local binary
        #[arg(long)]
        container: bool,

        /// How long to wait for mongod to come up (e.g. 30s, 1m)
        #[arg(long, value_name = "DURATION")]
        timeout: Option<String>,

        /// Print a URI with a random database name appended
        #[arg(long)]
        random_db: bool,
    },
    /// Kill a child process once its parent is gone
    #[command(hide = true)]
    Watchdog {
        /// PID to watch
        #[arg(long)]
        parent: u32,

        /// PID to kill when the parent disappears
        #[arg(long)]
        child: u32,

        /// Poll interval (e.g. 1s, 250ms)
        #[arg(long, default_value = "1s")]
        interval: String,
    },
}

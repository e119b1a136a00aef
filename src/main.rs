mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::start::StartArgs;
use memongo::{Error as MemongoError, Options};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if let Some(memongo_error) = e.downcast_ref::<MemongoError>() {
            eprintln!("Error: {}", memongo_error);
            if let Some(suggestion) = memongo_error.suggestion() {
                eprintln!("\nHint: {}", suggestion);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Watchdog {
            parent,
            child,
            interval,
        } => commands::run_watchdog(parent, child, &interval).await,
        Commands::Start {
            mongo_version,
            port,
            replica,
            container,
            timeout,
            random_db,
        } => {
            let options = match cli.config {
                Some(ref path) => Options::load(path)?,
                None => Options::default(),
            };
            let args = StartArgs {
                mongo_version,
                port,
                replica,
                container,
                timeout,
                random_db,
            };
            commands::run_start(options, args).await
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

use memongo::config::parse_duration_string;
use memongo::Options;
use tokio::signal::unix::{signal, SignalKind};

/// Command-line overrides for `memongo start`.
pub struct StartArgs {
    pub mongo_version: Option<String>,
    pub port: Option<u16>,
    pub replica: bool,
    pub container: bool,
    pub timeout: Option<String>,
    pub random_db: bool,
}

/// Apply command-line flags on top of options loaded from a file.
pub fn apply_args(mut options: Options, args: &StartArgs) -> anyhow::Result<Options> {
    if let Some(ref version) = args.mongo_version {
        options.mongo_version = version.clone();
    }
    if let Some(port) = args.port {
        options.port = port;
    }
    if args.replica {
        options.use_replica = true;
    }
    if args.container {
        options.use_container = true;
    }
    if let Some(ref raw) = args.timeout {
        let timeout = parse_duration_string(raw)
            .ok_or_else(|| anyhow::anyhow!("Invalid --timeout value '{}'", raw))?;
        options.startup_timeout = Some(timeout);
    }
    Ok(options)
}

pub async fn run_start(options: Options, args: StartArgs) -> anyhow::Result<()> {
    let options = apply_args(options, &args)?;

    // Installed before the server exists so an early Ctrl-C still stops it.
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let mut server = memongo::start_with_options(options).await?;

    let uri = if args.random_db {
        server.uri_with_random_db()
    } else {
        server.uri()
    };
    println!("{}", uri);
    if let Some(path) = server.db_path() {
        eprintln!("Data directory: {}", path.display());
    }
    eprintln!("Press Ctrl-C to stop");

    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }

    eprintln!("Stopping...");
    server.stop().await?;
    Ok(())
}

use memongo::config::parse_duration_string;
use memongo::error::validate_pid;
use memongo::server::{supervise, SuperviseExit};

pub async fn run_watchdog(parent: u32, child: u32, interval: &str) -> anyhow::Result<()> {
    let parent = validate_pid(parent, "watchdog parent")?;
    let child = validate_pid(child, "watchdog child")?;
    let interval = parse_duration_string(interval)
        .ok_or_else(|| anyhow::anyhow!("Invalid --interval value '{}'", interval))?;

    match supervise(parent, child, interval).await {
        SuperviseExit::ChildKilled => tracing::debug!("Watchdog killed PID {}", child),
        SuperviseExit::ChildExited => tracing::debug!("PID {} exited on its own", child),
    }
    Ok(())
}

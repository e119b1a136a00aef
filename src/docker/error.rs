use std::time::Duration;
use thiserror::Error;

/// Failures of the container launch path.
#[derive(Error, Debug)]
pub enum DockerError {
    #[error("Could not run '{}': {source}", .program.display())]
    Unavailable {
        program: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' did not finish within {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("Failed to pull image {image}{}: {stderr}", exit_suffix(.exit_code))]
    Pull {
        image: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("Failed to start a container from {image}{}: {stderr}", exit_suffix(.exit_code))]
    Run {
        image: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("docker run for {image} did not report a container ID")]
    MissingContainerId { image: String },

    #[error("Container {container} ({image}) exited during startup")]
    NotRunning { container: String, image: String },

    #[error("Failed to remove container {container}{}: {stderr}", exit_suffix(.exit_code))]
    Remove {
        container: String,
        stderr: String,
        exit_code: Option<i32>,
    },
}

fn exit_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" (exit code {})", c))
        .unwrap_or_default()
}

/// Trimmed stderr and exit code of a finished docker command.
pub(crate) fn failure_details(output: &std::process::Output) -> (String, Option<i32>) {
    (
        String::from_utf8_lossy(&output.stderr).trim().to_string(),
        output.status.code(),
    )
}

//! Thin wrapper around the `docker` CLI.
//!
//! All Docker interactions go through `DockerClient`, which provides
//! consistent timeout handling and error mapping to [`DockerError`].

use super::error::failure_details;
use super::DockerError;
use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

/// Image pulls can be slow on a cold cache.
pub const PULL_TIMEOUT: Duration = Duration::from_secs(600);
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct DockerClient {
    program: PathBuf,
}

impl DockerClient {
    /// Client for `docker` or another docker-compatible CLI (e.g. `podman`).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run a docker command with a timeout, returning raw Output.
    async fn run(&self, args: &[&str], timeout: Duration) -> Result<Output, DockerError> {
        let result = tokio::time::timeout(
            timeout,
            tokio::process::Command::new(&self.program)
                .args(args)
                .kill_on_drop(true)
                .output(),
        )
        .await;

        match result {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(DockerError::Unavailable {
                program: self.program.clone(),
                source: e,
            }),
            Err(_) => Err(DockerError::Timeout {
                command: format!("docker {}", args.join(" ")),
                timeout,
            }),
        }
    }

    /// Pull an image. An image that is already present is not an error.
    pub async fn pull(&self, image: &str) -> Result<(), DockerError> {
        let output = self.run(&["pull", image], PULL_TIMEOUT).await?;
        if output.status.success() {
            return Ok(());
        }
        let (stderr, exit_code) = failure_details(&output);
        if stderr.contains("up to date") || stderr.contains("already exists") {
            return Ok(());
        }
        Err(DockerError::Pull {
            image: image.to_string(),
            stderr,
            exit_code,
        })
    }

    /// `docker run -d --network host <image> <args..>`; returns the container ID.
    pub async fn run_host_network(
        &self,
        image: &str,
        container_args: &[String],
    ) -> Result<String, DockerError> {
        let mut args = vec!["run", "-d", "--network", "host", image];
        args.extend(container_args.iter().map(String::as_str));

        let output = self.run(&args, COMMAND_TIMEOUT).await?;
        if !output.status.success() {
            let (stderr, exit_code) = failure_details(&output);
            return Err(DockerError::Run {
                image: image.to_string(),
                stderr,
                exit_code,
            });
        }

        let id = String::from_utf8_lossy(&output.stdout)
            .lines()
            .last()
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if id.is_empty() {
            return Err(DockerError::MissingContainerId {
                image: image.to_string(),
            });
        }
        Ok(id)
    }

    /// Force-remove a container. Returns `Ok(())` if container doesn't exist.
    pub async fn rm_force(&self, container: &str) -> Result<(), DockerError> {
        let output = self.run(&["rm", "-f", container], COMMAND_TIMEOUT).await?;
        if output.status.success() {
            return Ok(());
        }
        let (stderr, exit_code) = failure_details(&output);
        if stderr.contains("No such container") {
            return Ok(());
        }
        Err(DockerError::Remove {
            container: container.to_string(),
            stderr,
            exit_code,
        })
    }

    /// Check if a container is running.
    pub async fn is_running(&self, container: &str) -> bool {
        let output = self
            .run(
                &["inspect", "-f", "{{.State.Running}}", container],
                COMMAND_TIMEOUT,
            )
            .await;
        match output {
            Ok(o) if o.status.success() => String::from_utf8_lossy(&o.stdout).trim() == "true",
            _ => false,
        }
    }
}

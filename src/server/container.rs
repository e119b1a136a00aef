//! Container launch path: `mongo:<version>` through the docker CLI.
//!
//! There is no log scanning here. After `docker run` the server is given a
//! fixed delay, and is assumed ready if the container is still running.

use super::handle::MongoServer;
use crate::config::{Config, Options};
use crate::docker::{image_for_version, DockerClient, DockerError};
use crate::error::Result;

/// Start `mongo:<version>` in a container with default options.
pub async fn start_container(version: &str) -> Result<MongoServer> {
    start_container_with_options(Options::new(version)).await
}

/// Start a container described by `options`; `use_container` is implied.
pub async fn start_container_with_options(options: Options) -> Result<MongoServer> {
    start_resolved(options.container(true).resolve()?).await
}

pub(super) async fn start_resolved(config: Config) -> Result<MongoServer> {
    let client = DockerClient::new(&config.docker_program);
    let image = image_for_version(&config.version);

    tracing::debug!("Pulling {}", image);
    client.pull(&image).await?;

    let args = vec!["--port".to_string(), config.port.to_string()];
    let id = client.run_host_network(&image, &args).await?;
    tracing::debug!("Started container {} from {}", id, image);

    tokio::time::sleep(config.container_startup_delay).await;

    if !client.is_running(&id).await {
        if let Err(e) = client.rm_force(&id).await {
            tracing::warn!("error removing container {}: {}", id, e);
        }
        return Err(DockerError::NotRunning {
            container: id,
            image,
        }
        .into());
    }

    tracing::info!("Started {} in container {} on port {}", config.name, id, config.port);
    Ok(MongoServer::from_container(config.name, config.port, id, client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    fn fake_docker(dir: &Path, running: bool) -> PathBuf {
        let log = dir.join("calls.log");
        let script = format!(
            "#!/bin/sh\necho \"$@\" >> {}\n[ \"$1\" = run ] && echo c0ffee\n[ \"$1\" = inspect ] && echo {}\nexit 0\n",
            log.display(),
            running
        );
        let path = dir.join("docker");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_container_start_and_stop() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options::new("6.0")
            .port(27123)
            .docker_program(fake_docker(dir.path(), true))
            .container_startup_delay(Duration::from_millis(10));

        let mut server = start_container_with_options(options).await.unwrap();
        assert_eq!(server.container_id(), Some("c0ffee"));
        assert_eq!(server.uri(), "mongodb://localhost:27123");
        server.stop().await.unwrap();

        let calls = std::fs::read_to_string(dir.path().join("calls.log")).unwrap();
        let calls: Vec<&str> = calls.lines().collect();
        assert_eq!(
            calls,
            vec![
                "pull mongo:6.0",
                "run -d --network host mongo:6.0 --port 27123",
                "inspect -f {{.State.Running}} c0ffee",
                "rm -f c0ffee",
            ]
        );
    }

    #[tokio::test]
    async fn test_container_that_exits_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options::new("6.0")
            .port(27124)
            .docker_program(fake_docker(dir.path(), false))
            .container_startup_delay(Duration::from_millis(10));

        let err = start_container_with_options(options).await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Docker(DockerError::NotRunning { ref container, .. }) if container == "c0ffee"
        ));

        let calls = std::fs::read_to_string(dir.path().join("calls.log")).unwrap();
        assert_eq!(calls.lines().last(), Some("rm -f c0ffee"));
    }

    #[tokio::test]
    async fn test_container_rejects_replica() {
        let err = start_container_with_options(Options::new("6.0").replica(true))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cannot be used together"));
    }
}

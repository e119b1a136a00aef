mod common;

use common::{fake_shell, is_alive, FakeMongod};
use memongo::{Error, Options, StorageEngine};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

fn options(fake: &FakeMongod) -> Options {
    Options::new("6.0")
        .binary_path(&fake.binary)
        .startup_timeout(Duration::from_secs(10))
}

#[tokio::test]
async fn test_stop_twice() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeMongod::ready(dir.path());

    let mut server = memongo::start_with_options(options(&fake)).await.unwrap();
    let watchdog_pid = server.watchdog_pid().unwrap();

    server.stop().await.unwrap();
    assert!(server.pid().is_none());
    assert!(!is_alive(watchdog_pid));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_after_server_died() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeMongod::ready(dir.path());

    let mut server = memongo::start_with_options(options(&fake)).await.unwrap();
    let db_path = server.db_path().unwrap().to_path_buf();

    Command::new("kill")
        .args(["-9", &fake.pid().to_string()])
        .status()
        .await
        .unwrap();

    server.stop().await.unwrap();
    assert!(!db_path.exists());
}

#[tokio::test]
async fn test_replica_set_is_initiated() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeMongod::ready(dir.path());
    let shell = fake_shell(dir.path(), 0);

    let mut server = memongo::start_with_options(
        options(&fake).port(27019).replica(true).mongo_shell(&shell),
    )
    .await
    .unwrap();

    let args = fake.args();
    assert!(args.starts_with("--storageEngine wiredTiger"));
    assert!(args.ends_with("--port 27019 --replSet rs0 --bind_ip localhost"));

    let shell_args = std::fs::read_to_string(dir.path().join("shell_args")).unwrap();
    assert!(shell_args.starts_with("--port 27019 --quiet --eval rs.initiate()"));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_replica_failure_unwinds() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeMongod::ready(dir.path());
    let shell = fake_shell(dir.path(), 1);

    let err = memongo::start_with_options(options(&fake).replica(true).mongo_shell(&shell))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ReplicaInitiation(_)));
    assert!(!fake.db_path().exists());
    assert!(!is_alive(fake.pid()));
}

#[tokio::test]
async fn test_replica_requires_durable_engine() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeMongod::ready(dir.path());

    let err = memongo::start_with_options(
        options(&fake)
            .replica(true)
            .storage_engine(StorageEngine::Ephemeral),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(!dir.path().join("pid").exists());
}

#[tokio::test]
async fn test_native_watchdog_program() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeMongod::ready(dir.path());

    let mut server = memongo::start_with_options(
        options(&fake)
            .watchdog_program(env!("CARGO_BIN_EXE_memongo"))
            .watchdog_interval(Duration::from_millis(50)),
    )
    .await
    .unwrap();

    let watchdog_pid = server.watchdog_pid().unwrap();
    assert!(is_alive(watchdog_pid));

    server.stop().await.unwrap();
    assert!(!is_alive(watchdog_pid));
}

#[tokio::test]
async fn test_watchdog_subcommand_kills_orphan() {
    let mut parent = Command::new("sleep").arg("60").spawn().unwrap();
    let mut child = Command::new("sleep").arg("60").spawn().unwrap();
    let parent_pid = parent.id().unwrap();
    let child_pid = child.id().unwrap();

    let mut watchdog = Command::new(env!("CARGO_BIN_EXE_memongo"))
        .args([
            "watchdog",
            "--parent",
            &parent_pid.to_string(),
            "--child",
            &child_pid.to_string(),
            "--interval",
            "50ms",
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    parent.kill().await.unwrap();

    let status = tokio::time::timeout(Duration::from_secs(5), child.wait())
        .await
        .expect("watchdog should kill the orphaned child")
        .unwrap();
    assert!(!status.success());

    let status = tokio::time::timeout(Duration::from_secs(5), watchdog.wait())
        .await
        .unwrap()
        .unwrap();
    assert!(status.success());
}

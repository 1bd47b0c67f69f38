// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use frd_adapters::{FakeRemoteAdapter, RemoteRoom};
use frd_core::PathsConfig;
use std::time::Duration;
use tempfile::TempDir;

fn test_config(dir: &TempDir) -> Config {
    Config {
        paths: PathsConfig {
            data_dir: dir.path().join("data"),
            backups_dir: dir.path().join("backups"),
            state_dir: dir.path().join("state"),
        },
        ..Config::default()
    }
}

async fn next_event(daemon: &mut DaemonState) -> EngineEvent {
    tokio::time::timeout(Duration::from_secs(10), daemon.events.recv())
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn startup_writes_pid_and_creates_stores() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.sync.enabled = false;

    let mut daemon = startup_with_remote::<FakeRemoteAdapter>(&config, None)
        .await
        .unwrap();

    let pid = std::fs::read_to_string(config.paths.lock_path()).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
    for store in ["frd_bot.db", "frd_room.db", "frd_scanner.db"] {
        assert!(config.paths.data_dir.join(store).exists(), "{store}");
    }
    assert_eq!(daemon.loops(), vec!["backup"]);

    daemon.shutdown().await.unwrap();
    assert!(!config.paths.lock_path().exists());
}

#[tokio::test]
async fn second_daemon_is_refused_and_keeps_first_pid_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.backup.enabled = false;
    config.sync.enabled = false;

    let mut first = startup_with_remote::<FakeRemoteAdapter>(&config, None)
        .await
        .unwrap();
    let err = startup_with_remote::<FakeRemoteAdapter>(&config, None)
        .await
        .err()
        .unwrap();

    assert!(matches!(err, LifecycleError::LockFailed(_)), "{err}");
    assert!(config.paths.lock_path().exists());
    first.shutdown().await.unwrap();
}

#[tokio::test]
async fn corrupt_store_does_not_block_startup() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.sync.enabled = false;
    std::fs::create_dir_all(&config.paths.data_dir).unwrap();
    std::fs::write(config.paths.data_dir.join("frd_room.db"), b"garbage bytes").unwrap();

    let mut daemon = startup_with_remote::<FakeRemoteAdapter>(&config, None)
        .await
        .unwrap();

    // No replica or snapshot exists yet, so the first tick raises the alarm
    assert_eq!(
        next_event(&mut daemon).await,
        EngineEvent::StoreUnrecovered {
            store: "frd_room.db".into()
        }
    );
    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn sync_loop_runs_at_startup_with_remote() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.backup.enabled = false;
    let remote = FakeRemoteAdapter::new();
    remote.insert(
        "Atrium",
        RemoteRoom {
            images: vec!["https://img.example/1.jpg".into()],
            last_edited: 42.0,
            ..RemoteRoom::default()
        },
    );

    let mut daemon = startup_with_remote(&config, Some(remote)).await.unwrap();
    assert_eq!(daemon.loops(), vec!["sync"]);

    match next_event(&mut daemon).await {
        EngineEvent::SyncCompleted(summary) => assert_eq!(summary.pulled, 1),
        other => panic!("unexpected event: {other:?}"),
    }
    daemon.shutdown().await.unwrap();

    let run_state = std::fs::read_to_string(config.paths.run_state_path()).unwrap();
    assert!(run_state.contains("last_sync_time"), "{run_state}");
}

#[tokio::test]
async fn sync_without_remote_is_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.backup.enabled = false;

    let mut daemon = startup(&config).await.unwrap();

    assert!(daemon.loops().is_empty());
    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn failed_startup_removes_pid_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.sync.enabled = false;
    // A file where the data directory should be
    std::fs::write(&config.paths.data_dir, b"not a directory").unwrap();

    let err = startup_with_remote::<FakeRemoteAdapter>(&config, None)
        .await
        .err()
        .unwrap();

    assert!(!matches!(err, LifecycleError::LockFailed(_)));
    assert!(!config.paths.lock_path().exists());
}

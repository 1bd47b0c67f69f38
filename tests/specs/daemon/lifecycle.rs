//! Daemon lifecycle specs
//!
//! Verify frdd startup, single-instance locking and signal shutdown.

use crate::prelude::*;
use crate::prelude::assert_eq;
use std::time::Duration;

#[test]
fn daemon_creates_stores_and_pid_file() {
    let project = Project::empty();
    let daemon = project.start_daemon();

    let pid = std::fs::read_to_string(project.state("daemon.pid")).unwrap();
    assert_eq!(pid.trim(), daemon.pid().to_string());
    assert!(project.store("frd_room.db").is_file());

    project
        .frd()
        .args(&["status"])
        .passes()
        .stdout_has(&format!("running (pid {})", daemon.pid()));
}

#[test]
fn sigterm_stops_daemon_and_removes_pid_file() {
    let project = Project::empty();
    let daemon = project.start_daemon();

    let status = daemon.stop();

    assert!(status.success(), "{status:?}");
    assert!(!project.state("daemon.pid").exists());
}

#[test]
fn second_daemon_is_refused() {
    let project = Project::empty();
    let first = project.start_daemon();

    let output = std::process::Command::new(assert_cmd::cargo::cargo_bin("frdd"))
        .current_dir(project.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let pid = std::fs::read_to_string(project.state("daemon.pid")).unwrap();
    assert_eq!(pid.trim(), first.pid().to_string());
}

#[test]
fn daemon_ticks_take_backups() {
    let project = Project::empty();
    let _daemon = project.start_daemon();

    let backed_up = wait_for(Duration::from_secs(10), || {
        project
            .path()
            .join("backups/replicas/frd_room.db")
            .is_file()
    });
    assert!(backed_up, "no replica written by the daemon");
}

//! Daemon log specs

use crate::prelude::*;
use std::time::Duration;

#[test]
fn log_starts_with_marker_and_records_ticks() {
    let project = Project::empty();
    let daemon = project.start_daemon();
    let pid = daemon.pid();

    let ticked = wait_for(Duration::from_secs(10), || {
        std::fs::read_to_string(project.state("daemon.log"))
            .map(|log| log.contains("backup tick"))
            .unwrap_or(false)
    });
    daemon.stop();

    let log = std::fs::read_to_string(project.state("daemon.log")).unwrap();
    assert!(ticked, "no tick logged:\n{log}");
    assert!(
        log.starts_with(&format!("--- frdd: starting (pid: {pid}) ---")),
        "{log}"
    );
    assert!(log.contains("Daemon stopped"), "{log}");
}

#[test]
fn failed_start_is_logged() {
    let project = Project::empty();
    let _first = project.start_daemon();

    let _ = std::process::Command::new(assert_cmd::cargo::cargo_bin("frdd"))
        .current_dir(project.path())
        .output()
        .unwrap();

    let log = std::fs::read_to_string(project.state("daemon.log")).unwrap();
    assert!(log.contains("ERROR Failed to start daemon"), "{log}");
}

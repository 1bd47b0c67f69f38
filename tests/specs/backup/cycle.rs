//! End-to-end backup and recovery specs

use crate::prelude::*;
use crate::prelude::assert_eq;

#[test]
fn corrupted_store_comes_back_from_its_replica() {
    let project = Project::empty();
    project.frd().args(&["init"]).passes();
    project.frd().args(&["tick"]).passes();

    project.corrupt("frd_room.db");
    project
        .frd()
        .args(&["check", "frd_room.db"])
        .fails()
        .stdout_has("frd_room.db: corrupt");

    project
        .frd()
        .args(&["tick"])
        .passes()
        .stdout_has("recovered: frd_room.db");
    project
        .frd()
        .args(&["check"])
        .passes()
        .stdout_has("frd_room.db: ok");
}

#[test]
fn snapshots_listed_newest_first() {
    let project = Project::empty();
    project.frd().args(&["init"]).passes();
    project.frd().args(&["snapshot", "frd_bot.db"]).passes();
    // Snapshot names carry second resolution
    std::thread::sleep(std::time::Duration::from_millis(1100));
    project.frd().args(&["snapshot", "frd_bot.db"]).passes();

    let listing = project
        .frd()
        .args(&["--json", "snapshots", "frd_bot.db"])
        .passes()
        .json();
    let rows = listing.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[0]["created_at"].as_str().unwrap() > rows[1]["created_at"].as_str().unwrap());

    project
        .frd()
        .args(&["restore", "frd_bot.db", "--snapshot", "1"])
        .passes()
        .stdout_has("restored from snapshot #1");
}

#[test]
fn status_reflects_completed_tick() {
    let project = Project::empty();
    project.frd().args(&["init"]).passes();
    project.frd().args(&["tick"]).passes();

    let status = project.frd().args(&["--json", "status"]).passes().json();
    assert!(status["last_snapshot"].is_string());
    assert!(status["last_replica"].is_string());
    assert!(status["last_sync"].is_null());
    assert_eq!(status["stores"].as_array().unwrap().len(), 3);
}

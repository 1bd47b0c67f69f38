//! Error presentation specs

use crate::prelude::*;

#[test]
fn unknown_store_lists_registered_stores() {
    Project::empty()
        .frd()
        .args(&["snapshot", "nope.db"])
        .fails()
        .stderr_has("error: Unknown store 'nope.db'")
        .stderr_has("frd_bot.db, frd_room.db, frd_scanner.db");
}

#[test]
fn sync_without_remote_suggests_configuration() {
    Project::empty()
        .frd()
        .args(&["sync"])
        .fails()
        .stderr_has("Remote API not configured")
        .stderr_has("suggestions:");
}

#[test]
fn mirror_without_confirmation_is_refused() {
    Project::empty()
        .frd()
        .args(&["mirror"])
        .fails()
        .stderr_has("frd mirror --yes");
}

#[test]
fn explicit_missing_config_is_an_error() {
    Project::empty()
        .frd()
        .args(&["--config", "missing.toml", "status"])
        .fails()
        .stderr_has("missing.toml");
}

#[test]
fn invalid_config_is_reported() {
    let project = Project::empty();
    std::fs::write(project.path().join("bad.toml"), "[backup]\ntick = \"0s\"\n").unwrap();

    project
        .frd()
        .args(&["--config", "bad.toml", "status"])
        .fails()
        .stderr_has("backup.tick must be non-zero");
}

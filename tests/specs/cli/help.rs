//! Help output specs

use crate::prelude::*;

#[test]
fn help_lists_every_command() {
    let project = Project::empty();
    let out = project.frd().args(&["--help"]).passes();
    for command in [
        "init", "check", "snapshot", "replica", "snapshots", "prune", "recover", "restore",
        "tick", "sync", "mirror", "migrate", "status",
    ] {
        assert!(out.stdout.contains(command), "missing {command}");
    }
}

#[test]
fn restore_help_names_both_sources() {
    Project::empty()
        .frd()
        .args(&["restore", "--help"])
        .passes()
        .stdout_has("--replica")
        .stdout_has("--snapshot");
}

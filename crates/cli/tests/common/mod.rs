// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temp directory holding an `frd.toml` with every path inside it.
/// No remote is configured and `FRD_API_KEY` is cleared for each command.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(
            dir.path().join("frd.toml"),
            r#"
[paths]
data_dir = "data"
backups_dir = "backups"
state_dir = "state"

[backup]
snapshot_max_age = "3days"
"#,
        )
        .expect("Failed to write config");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store(&self, id: &str) -> PathBuf {
        self.path().join("data").join(id)
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.path().join("backups").join("snapshots")
    }

    pub fn replica(&self, id: &str) -> PathBuf {
        self.path().join("backups").join("replicas").join(id)
    }

    /// `frd` run from the env's directory, picking up its frd.toml
    pub fn frd(&self) -> Command {
        let mut cmd = Command::cargo_bin("frd").expect("frd binary");
        cmd.current_dir(self.path())
            .env_remove("FRD_API_KEY")
            .env_remove("FRD_CONFIG");
        cmd
    }

    /// Run `frd init` and assert it succeeded
    pub fn init(&self) -> &Self {
        self.frd().arg("init").assert().success();
        self
    }

    /// Overwrite a store with bytes that are not a SQLite database
    pub fn corrupt(&self, id: &str) {
        fs::write(self.store(id), b"this is not a database").expect("Failed to corrupt store");
    }

    pub fn insert_room(&self, name: &str, last_updated: i64) {
        let conn = rusqlite::Connection::open(self.store("frd_room.db")).expect("open room store");
        conn.execute(
            "INSERT INTO room_db (room_name, last_updated, doc_by_user_id) VALUES (?1, ?2, 1)",
            rusqlite::params![name, last_updated],
        )
        .expect("insert room");
    }

    pub fn room_names(&self) -> Vec<String> {
        let conn = rusqlite::Connection::open(self.store("frd_room.db")).expect("open room store");
        let mut stmt = conn
            .prepare("SELECT room_name FROM room_db ORDER BY room_name")
            .expect("prepare");
        stmt.query_map([], |row| row.get(0))
            .expect("query")
            .collect::<Result<Vec<String>, _>>()
            .expect("rows")
    }
}

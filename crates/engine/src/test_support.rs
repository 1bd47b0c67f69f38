// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests

use frd_storage::{RoomStore, RunState, StoreDef, StoreRegistry};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Temp workspace with a registry and run-state file
pub struct Fixture {
    pub dir: TempDir,
    pub registry: Arc<StoreRegistry>,
    pub run_state: Arc<RunState>,
}

impl Fixture {
    /// Two small stores, `a.db` and `b.db`, each with an `items` table
    pub fn items() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let table = "CREATE TABLE IF NOT EXISTS items (name TEXT PRIMARY KEY);";
        let registry = StoreRegistry::new(
            dir.path().join("data"),
            vec![
                StoreDef::new("a.db").table("items", table),
                StoreDef::new("b.db").table("items", table),
            ],
        )
        .unwrap();
        Self::finish(dir, registry)
    }

    /// The production store catalogue
    pub fn rooms() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let registry = StoreRegistry::with_default_stores(dir.path().join("data")).unwrap();
        Self::finish(dir, registry)
    }

    fn finish(dir: TempDir, registry: StoreRegistry) -> Self {
        registry.init_all().unwrap();
        let run_state = RunState::open(dir.path().join("state/run_state.json")).unwrap();
        Self {
            dir,
            registry: Arc::new(registry),
            run_state: Arc::new(run_state),
        }
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.dir.path().join("backups")
    }

    pub fn store_path(&self, id: &str) -> PathBuf {
        self.registry.path_of(id).unwrap()
    }

    pub fn room_store(&self) -> RoomStore {
        self.registry.rooms().unwrap()
    }

    pub fn reopen_run_state(&self) -> RunState {
        RunState::open(self.run_state.path()).unwrap()
    }
}

pub fn insert_item(path: &Path, name: &str) {
    let conn = Connection::open(path).unwrap();
    conn.execute("INSERT INTO items (name) VALUES (?1)", [name])
        .unwrap();
}

pub fn items(path: &Path) -> Vec<String> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn.prepare("SELECT name FROM items ORDER BY name").unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

/// Overwrite a file with bytes SQLite rejects
pub fn corrupt(path: &Path) {
    std::fs::write(path, b"not a database, just some bytes on disk").unwrap();
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for storage tests

use crate::registry::{StoreDef, StoreRegistry};
use rusqlite::Connection;
use std::path::Path;

/// Create a small valid SQLite file holding `rows` in table `items`
pub fn write_store(path: &Path, rows: &[&str]) {
    let _ = std::fs::remove_file(path);
    let conn = Connection::open(path).unwrap();
    conn.execute_batch("CREATE TABLE IF NOT EXISTS items (name TEXT PRIMARY KEY);")
        .unwrap();
    for row in rows {
        conn.execute("INSERT INTO items (name) VALUES (?1)", [row])
            .unwrap();
    }
}

/// Read back the rows written by `write_store`
pub fn read_rows(path: &Path) -> Vec<String> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn.prepare("SELECT name FROM items ORDER BY name").unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

/// Overwrite a file with bytes SQLite rejects
pub fn corrupt(path: &Path) {
    std::fs::write(path, b"this is definitely not a sqlite database file").unwrap();
}

/// Registry with two single-table stores rooted at `data_dir`
pub fn two_store_registry(data_dir: &Path) -> StoreRegistry {
    let table = "CREATE TABLE IF NOT EXISTS items (name TEXT PRIMARY KEY);";
    StoreRegistry::new(
        data_dir,
        vec![
            StoreDef::new("a.db").table("items", table),
            StoreDef::new("b.db").table("items", table),
        ],
    )
    .unwrap()
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store registry
//!
//! Maps each store id (its file name) to the tables it must contain. Built
//! once at startup and shared read-only by both loops.

use crate::error::StorageError;
use crate::rooms::RoomStore;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub const BOT_STORE: &str = "frd_bot.db";
pub const ROOM_STORE: &str = "frd_room.db";
pub const SCANNER_STORE: &str = "frd_scanner.db";

/// One table and the DDL that creates it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub name: String,
    pub ddl: String,
}

/// A registered store: file name, ordered tables, and post-create extras
/// (indexes, triggers) applied after the tables exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDef {
    pub id: String,
    pub tables: Vec<TableDef>,
    pub extras: Vec<String>,
}

impl StoreDef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tables: Vec::new(),
            extras: Vec::new(),
        }
    }

    pub fn table(mut self, name: impl Into<String>, ddl: impl Into<String>) -> Self {
        self.tables.push(TableDef {
            name: name.into(),
            ddl: ddl.into(),
        });
        self
    }

    pub fn extra(mut self, sql: impl Into<String>) -> Self {
        self.extras.push(sql.into());
        self
    }

    /// Create missing tables, then extras, on an open connection
    pub fn apply_schema(&self, conn: &Connection) -> Result<(), StorageError> {
        for table in &self.tables {
            conn.execute_batch(&table.ddl)?;
        }
        for sql in &self.extras {
            conn.execute_batch(sql)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), StorageError> {
        let id = self.id.as_str();
        if id.is_empty() || id.starts_with('.') || id.contains(['/', '\\']) {
            return Err(StorageError::InvalidStore(format!(
                "store id must be a plain file name: {id:?}"
            )));
        }
        if self.tables.is_empty() {
            return Err(StorageError::InvalidStore(format!("{id} has no tables")));
        }
        Ok(())
    }
}

/// The set of stores protected and served by this process
#[derive(Debug, Clone)]
pub struct StoreRegistry {
    data_dir: PathBuf,
    stores: Vec<StoreDef>,
}

impl StoreRegistry {
    /// Build a registry, rejecting duplicate or malformed definitions
    pub fn new(
        data_dir: impl Into<PathBuf>,
        stores: Vec<StoreDef>,
    ) -> Result<Self, StorageError> {
        for (i, def) in stores.iter().enumerate() {
            def.validate()?;
            if stores[..i].iter().any(|other| other.id == def.id) {
                return Err(StorageError::InvalidStore(format!(
                    "duplicate store id {}",
                    def.id
                )));
            }
        }
        Ok(Self {
            data_dir: data_dir.into(),
            stores,
        })
    }

    /// Registry of the bot, room and scanner stores
    pub fn with_default_stores(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Self::new(data_dir, default_stores())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn stores(&self) -> &[StoreDef] {
        &self.stores
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.stores.iter().map(|s| s.id.as_str())
    }

    pub fn get(&self, id: &str) -> Result<&StoreDef, StorageError> {
        self.stores
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| StorageError::UnknownStore(id.to_string()))
    }

    /// Path of the live store file
    pub fn path_of(&self, id: &str) -> Result<PathBuf, StorageError> {
        let def = self.get(id)?;
        Ok(self.data_dir.join(&def.id))
    }

    /// Create the store file if needed and bring its tables up to date
    pub fn init_store(&self, id: &str) -> Result<(), StorageError> {
        let def = self.get(id)?;
        std::fs::create_dir_all(&self.data_dir)?;
        let conn = Connection::open(self.data_dir.join(&def.id))?;
        def.apply_schema(&conn)?;
        tracing::debug!(store = %def.id, tables = def.tables.len(), "store initialised");
        Ok(())
    }

    pub fn init_all(&self) -> Result<(), StorageError> {
        for id in self.ids() {
            self.init_store(id)?;
        }
        Ok(())
    }

    /// Accessor for the room store
    pub fn rooms(&self) -> Result<RoomStore, StorageError> {
        Ok(RoomStore::new(self.path_of(ROOM_STORE)?))
    }
}

/// Stores registered by a standard deployment
pub fn default_stores() -> Vec<StoreDef> {
    vec![
        StoreDef::new(BOT_STORE).table(
            "server_profiles",
            "CREATE TABLE IF NOT EXISTS server_profiles (
                server_id INTEGER PRIMARY KEY,
                leaderboard_channel_id INTEGER,
                documented_channel_id INTEGER,
                doc_msg_ids TEXT
            );",
        ),
        StoreDef::new(ROOM_STORE)
            .table(
                "room_db",
                "CREATE TABLE IF NOT EXISTS room_db (
                    room_name TEXT PRIMARY KEY,
                    picture_urls TEXT NOT NULL DEFAULT '[]',
                    description TEXT NOT NULL DEFAULT '',
                    tags TEXT NOT NULL DEFAULT '[]',
                    roomtype TEXT NOT NULL DEFAULT '',
                    last_updated INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
                    doc_by_user_id INTEGER NOT NULL,
                    edited_by_user_id INTEGER,
                    edits TEXT NOT NULL DEFAULT '[]'
                );",
            )
            .table(
                "room_bug_reports",
                "CREATE TABLE IF NOT EXISTS room_bug_reports (
                    report_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    room_name TEXT NOT NULL,
                    report_text TEXT NOT NULL,
                    reported_by_user_id INTEGER NOT NULL,
                    resolved INTEGER NOT NULL DEFAULT 0,
                    deleted INTEGER NOT NULL DEFAULT 0,
                    timestamp INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
                );",
            ),
        StoreDef::new(SCANNER_STORE)
            .table(
                "sessions",
                "CREATE TABLE IF NOT EXISTS sessions (
                    session_id TEXT PRIMARY KEY,
                    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
                    last_edited_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
                    scanner_version TEXT NOT NULL,
                    closed INTEGER NOT NULL DEFAULT 0
                );",
            )
            .table(
                "encountered_rooms",
                "CREATE TABLE IF NOT EXISTS encountered_rooms (
                    event_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_event TEXT NOT NULL,
                    session_id TEXT NOT NULL,
                    room_name TEXT NOT NULL,
                    found_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
                    FOREIGN KEY (session_id) REFERENCES sessions(session_id)
                );",
            )
            .extra(
                "CREATE TRIGGER IF NOT EXISTS update_last_edited_at
                AFTER INSERT ON encountered_rooms
                BEGIN
                    UPDATE sessions
                    SET last_edited_at = strftime('%s', 'now')
                    WHERE session_id = NEW.session_id;
                END;",
            )
            .extra("CREATE INDEX IF NOT EXISTS idx_sessions_open_closed ON sessions(closed);")
            .extra(
                "CREATE INDEX IF NOT EXISTS idx_rooms_session_id ON encountered_rooms(session_id);",
            )
            .extra("CREATE INDEX IF NOT EXISTS idx_rooms_found_at ON encountered_rooms(found_at);"),
    ]
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

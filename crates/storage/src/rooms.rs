// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Room store accessor
//!
//! Reads and writes `room_db` rows in the room store. Lists are stored as
//! JSON text columns. Each call opens its own connection and runs in a
//! single transaction.

use crate::error::StorageError;
use frd_core::{merge_history, EditRecord, RoomDoc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SELECT_ROOM: &str = "SELECT room_name, picture_urls, description, tags, roomtype, \
     last_updated, doc_by_user_id, edited_by_user_id, edits FROM room_db";

/// What happens to a room's edit history on a full replace
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryPolicy {
    /// Keep the existing local history (empty for a new room)
    Preserve,
    /// Union of the existing local history and these entries
    Merge(Vec<EditRecord>),
    /// Overwrite history with exactly these entries
    Replace(Vec<EditRecord>),
}

/// Accessor for the `room_db` table
#[derive(Debug, Clone)]
pub struct RoomStore {
    path: PathBuf,
}

/// Row as stored, before JSON columns are decoded
struct RawRoom {
    name: String,
    picture_urls: String,
    description: String,
    tags: String,
    roomtype: String,
    last_updated: f64,
    documented_by: i64,
    edited_by: Option<i64>,
    edits: String,
}

impl RawRoom {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            picture_urls: row.get(1)?,
            description: row.get(2)?,
            tags: row.get(3)?,
            roomtype: row.get(4)?,
            last_updated: row.get(5)?,
            documented_by: row.get(6)?,
            edited_by: row.get(7)?,
            edits: row.get(8)?,
        })
    }

    fn decode(self) -> Result<RoomDoc, StorageError> {
        Ok(RoomDoc {
            picture_urls: serde_json::from_str(&self.picture_urls)?,
            tags: serde_json::from_str(&self.tags)?,
            edits: serde_json::from_str(&self.edits)?,
            name: self.name,
            description: self.description,
            roomtype: self.roomtype,
            last_updated: self.last_updated,
            documented_by: self.documented_by,
            edited_by: self.edited_by,
        })
    }
}

impl RoomStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Connection, StorageError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    pub fn get(&self, name: &str) -> Result<Option<RoomDoc>, StorageError> {
        let conn = self.open()?;
        fetch(&conn, name)
    }

    /// Every room keyed by name
    pub fn all(&self) -> Result<BTreeMap<String, RoomDoc>, StorageError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(SELECT_ROOM)?;
        let raws = stmt
            .query_map([], RawRoom::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter()
            .map(|raw| raw.decode().map(|doc| (doc.name.clone(), doc)))
            .collect()
    }

    pub fn names(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare("SELECT room_name FROM room_db ORDER BY room_name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Interactive documentation: an existing room's prior state is appended
    /// to its history before the new content is written. The original
    /// documenter is kept.
    pub fn document(&self, doc: &RoomDoc, editor: Option<i64>) -> Result<(), StorageError> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        match fetch(&tx, &doc.name)? {
            Some(existing) => {
                let mut edits = existing.edits.clone();
                edits.push(existing.to_edit_record(editor, doc.last_updated));
                let mut updated = doc.clone();
                updated.documented_by = existing.documented_by;
                updated.edited_by = editor.or(Some(doc.documented_by));
                updated.edits = edits;
                write(&tx, &updated)?;
            }
            None => {
                let mut created = doc.clone();
                created.edited_by = None;
                created.edits = Vec::new();
                write(&tx, &created)?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Full overwrite of one room; `history` decides the resulting edits.
    /// Returns the history that was written.
    pub fn replace(
        &self,
        doc: &RoomDoc,
        history: HistoryPolicy,
    ) -> Result<Vec<EditRecord>, StorageError> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let existing = existing_edits(&tx, &doc.name)?;
        let edits = match history {
            HistoryPolicy::Preserve => existing.unwrap_or_default(),
            HistoryPolicy::Merge(incoming) => {
                merge_history(&existing.unwrap_or_default(), &incoming)
            }
            HistoryPolicy::Replace(edits) => edits,
        };
        let mut row = doc.clone();
        row.edits = edits;
        write(&tx, &row)?;
        tx.commit()?;
        Ok(row.edits)
    }

    /// Returns whether a row was removed
    pub fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let conn = self.open()?;
        let removed = conn.execute("DELETE FROM room_db WHERE room_name = ?1", [name])?;
        Ok(removed > 0)
    }
}

fn fetch(conn: &Connection, name: &str) -> Result<Option<RoomDoc>, StorageError> {
    let raw = conn
        .query_row(
            &format!("{SELECT_ROOM} WHERE room_name = ?1"),
            [name],
            RawRoom::from_row,
        )
        .optional()?;
    raw.map(RawRoom::decode).transpose()
}

fn existing_edits(tx: &Transaction<'_>, name: &str) -> Result<Option<Vec<EditRecord>>, StorageError> {
    let edits: Option<String> = tx
        .query_row(
            "SELECT edits FROM room_db WHERE room_name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    edits
        .map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(StorageError::from)
}

fn write(tx: &Transaction<'_>, doc: &RoomDoc) -> Result<(), StorageError> {
    tx.execute(
        "INSERT INTO room_db (room_name, picture_urls, description, tags, roomtype,
                              last_updated, doc_by_user_id, edited_by_user_id, edits)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(room_name) DO UPDATE SET
             picture_urls = excluded.picture_urls,
             description = excluded.description,
             tags = excluded.tags,
             roomtype = excluded.roomtype,
             last_updated = excluded.last_updated,
             doc_by_user_id = excluded.doc_by_user_id,
             edited_by_user_id = excluded.edited_by_user_id,
             edits = excluded.edits",
        params![
            doc.name,
            serde_json::to_string(&doc.picture_urls)?,
            doc.description,
            serde_json::to_string(&doc.tags)?,
            doc.roomtype,
            doc.last_updated,
            doc.documented_by,
            doc.edited_by,
            serde_json::to_string(&doc.edits)?,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "rooms_tests.rs"]
mod tests;

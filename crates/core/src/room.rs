// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Room documentation entity
//!
//! A room is the unit reconciled against the remote archive. Its edit history
//! records every prior state so provenance survives overwrites.

use serde::{Deserialize, Serialize};

/// One prior state of a room, captured before an overwrite
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditRecord {
    pub timestamp: f64,
    pub previous_room_name: String,
    pub previous_picture_urls: Vec<String>,
    pub previous_tags: Vec<String>,
    pub previous_description: String,
    pub previous_roomtype: String,
    pub previous_doc_by_user_id: Option<i64>,
    pub edited_by_user_id: Option<i64>,
}

/// A documented room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDoc {
    pub name: String,
    pub picture_urls: Vec<String>,
    pub description: String,
    pub tags: Vec<String>,
    pub roomtype: String,
    /// Unix seconds of the last modification
    pub last_updated: f64,
    pub documented_by: i64,
    pub edited_by: Option<i64>,
    pub edits: Vec<EditRecord>,
}

impl RoomDoc {
    pub fn new(name: impl Into<String>, documented_by: i64, last_updated: f64) -> Self {
        Self {
            name: name.into(),
            picture_urls: Vec::new(),
            description: String::new(),
            tags: Vec::new(),
            roomtype: String::new(),
            last_updated,
            documented_by,
            edited_by: None,
            edits: Vec::new(),
        }
    }

    pub fn with_pictures<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.picture_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_roomtype(mut self, roomtype: impl Into<String>) -> Self {
        self.roomtype = roomtype.into();
        self
    }

    /// Snapshot this state as the "previous" side of an edit
    pub fn to_edit_record(&self, editor: Option<i64>, at: f64) -> EditRecord {
        EditRecord {
            timestamp: at,
            previous_room_name: self.name.clone(),
            previous_picture_urls: self.picture_urls.clone(),
            previous_tags: self.tags.clone(),
            previous_description: self.description.clone(),
            previous_roomtype: self.roomtype.clone(),
            previous_doc_by_user_id: Some(self.documented_by),
            edited_by_user_id: editor.or(Some(self.documented_by)),
        }
    }

    /// True when the documented content matches, ignoring history
    pub fn same_payload(&self, other: &RoomDoc) -> bool {
        self.name == other.name
            && self.picture_urls == other.picture_urls
            && self.description == other.description
            && self.tags == other.tags
            && self.roomtype == other.roomtype
            && self.documented_by == other.documented_by
    }
}

/// Union of two histories; never drops an entry from `local`.
///
/// Incoming entries already present are ignored. When anything is added the
/// result is ordered by timestamp (stable, so ties keep local order first).
pub fn merge_history(local: &[EditRecord], incoming: &[EditRecord]) -> Vec<EditRecord> {
    let mut merged = local.to_vec();
    let before = merged.len();
    for record in incoming {
        if !merged.contains(record) {
            merged.push(record.clone());
        }
    }
    if merged.len() != before {
        merged.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    }
    merged
}

#[cfg(test)]
#[path = "room_tests.rs"]
mod tests;

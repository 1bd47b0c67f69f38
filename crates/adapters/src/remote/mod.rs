// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote room archive adapters
//!
//! The archive exposes a bulk export of every room and a per-room upsert.
//! Both are authenticated with a bearer key.

mod http;
mod noop;

pub use http::HttpRemoteAdapter;
pub use noop::NoOpRemoteAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRemoteAdapter, RemoteCall};

use async_trait::async_trait;
use frd_core::{AssetPolicy, EditRecord, RoomDoc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from remote calls
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("remote API not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("remote returned HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("remote rejected request: {0}")]
    Rejected(String),
    #[error("needs at least {required} images (has {valid})")]
    InsufficientAssets { valid: usize, required: usize },
}

impl RemoteError {
    /// An expected refusal that should be counted as a skip, not a failure
    pub fn is_skip(&self) -> bool {
        matches!(self, RemoteError::InsufficientAssets { .. })
    }
}

/// One room as the archive exports it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteRoom {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub roomtype: String,
    #[serde(default, deserialize_with = "user_id")]
    pub documented_by: i64,
    #[serde(default)]
    pub last_edited: f64,
    #[serde(default, deserialize_with = "optional_user_id")]
    pub last_edited_by: Option<i64>,
    /// Edit history, when the archive tracks one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edits: Option<Vec<EditRecord>>,
}

impl RemoteRoom {
    /// Local form of this room. Only well-formed http(s) images are kept;
    /// edit history is left empty for the caller's history policy to fill.
    pub fn to_room_doc(&self, name: &str) -> RoomDoc {
        RoomDoc {
            name: name.to_string(),
            picture_urls: AssetPolicy::filter_valid(&self.images),
            description: self.description.clone(),
            tags: self.tags.clone(),
            roomtype: self.roomtype.clone(),
            last_updated: self.last_edited,
            documented_by: self.documented_by,
            edited_by: self.last_edited_by,
            edits: Vec::new(),
        }
    }
}

/// Snapshot of the whole archive
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteExport {
    pub rooms: BTreeMap<String, RemoteRoom>,
    pub exported_at: Option<String>,
}

/// Body of an upsert request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomUpload {
    pub room_name: String,
    pub description: String,
    pub images: Vec<String>,
    pub documented_by: i64,
    pub tags: Vec<String>,
    pub roomtype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_edited_by: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_edited: Option<f64>,
}

impl RoomUpload {
    /// Upload for `doc` carrying `images` (already validated and capped)
    pub fn from_doc(doc: &RoomDoc, images: Vec<String>) -> Self {
        Self {
            room_name: doc.name.clone(),
            description: doc.description.clone(),
            images,
            documented_by: doc.documented_by,
            tags: doc.tags.clone(),
            roomtype: doc.roomtype.clone(),
            last_edited_by: doc.edited_by,
            last_edited: Some(doc.last_updated),
        }
    }

    /// How the archive will store this upload
    pub fn to_remote_room(&self) -> RemoteRoom {
        RemoteRoom {
            images: self.images.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
            roomtype: self.roomtype.clone(),
            documented_by: self.documented_by,
            last_edited: self.last_edited.unwrap_or_default(),
            last_edited_by: self.last_edited_by,
            edits: None,
        }
    }
}

/// Adapter for the remote room archive
#[async_trait]
pub trait RemoteAdapter: Clone + Send + Sync + 'static {
    /// Fetch every room. Any failure means no data; callers must not merge
    /// against a partial export.
    async fn export(&self) -> Result<RemoteExport, RemoteError>;

    /// Create or overwrite one room
    async fn upsert(&self, room: &RoomUpload) -> Result<(), RemoteError>;
}

/// User ids arrive as numbers or as decimal strings
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

fn parse_id<E: serde::de::Error>(raw: RawId) -> Result<i64, E> {
    match raw {
        RawId::Int(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| E::custom(format!("invalid user id {text:?}"))),
    }
}

fn user_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    parse_id(RawId::deserialize(deserializer)?)
}

fn optional_user_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Option::<RawId>::deserialize(deserializer)?
        .map(parse_id)
        .transpose()
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

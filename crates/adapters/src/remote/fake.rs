// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake remote archive for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{RemoteAdapter, RemoteError, RemoteExport, RemoteRoom, RoomUpload};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Recorded remote call
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Export,
    Upsert { room: RoomUpload },
}

#[derive(Default)]
struct FakeState {
    rooms: BTreeMap<String, RemoteRoom>,
    calls: Vec<RemoteCall>,
    export_error: Option<RemoteError>,
    upsert_errors: HashMap<String, RemoteError>,
    min_assets: usize,
}

/// In-memory remote archive
#[derive(Clone, Default)]
pub struct FakeRemoteAdapter {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeRemoteAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Refuse uploads with fewer than `min` images, like the real archive
    pub fn with_min_assets(self, min: usize) -> Self {
        self.state().min_assets = min;
        self
    }

    /// Seed a room
    pub fn insert(&self, name: &str, room: RemoteRoom) {
        self.state().rooms.insert(name.to_string(), room);
    }

    pub fn room(&self, name: &str) -> Option<RemoteRoom> {
        self.state().rooms.get(name).cloned()
    }

    pub fn rooms(&self) -> BTreeMap<String, RemoteRoom> {
        self.state().rooms.clone()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state().calls.clone()
    }

    /// Names of rooms upserted so far, in call order
    pub fn upserted(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                RemoteCall::Upsert { room } => Some(room.room_name.clone()),
                RemoteCall::Export => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Make every export fail with `error` until cleared
    pub fn fail_export(&self, error: Option<RemoteError>) {
        self.state().export_error = error;
    }

    /// Make uploads of `name` fail with `error`
    pub fn fail_upsert(&self, name: &str, error: RemoteError) {
        self.state().upsert_errors.insert(name.to_string(), error);
    }
}

#[async_trait]
impl RemoteAdapter for FakeRemoteAdapter {
    async fn export(&self) -> Result<RemoteExport, RemoteError> {
        let mut state = self.state();
        state.calls.push(RemoteCall::Export);
        if let Some(err) = &state.export_error {
            return Err(err.clone());
        }
        Ok(RemoteExport {
            rooms: state.rooms.clone(),
            exported_at: None,
        })
    }

    async fn upsert(&self, room: &RoomUpload) -> Result<(), RemoteError> {
        let mut state = self.state();
        state.calls.push(RemoteCall::Upsert { room: room.clone() });
        if let Some(err) = state.upsert_errors.get(&room.room_name) {
            return Err(err.clone());
        }
        if room.images.len() < state.min_assets {
            return Err(RemoteError::InsufficientAssets {
                valid: room.images.len(),
                required: state.min_assets,
            });
        }
        state
            .rooms
            .insert(room.room_name.clone(), room.to_remote_room());
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted run-state: last-run timestamps that gate the schedulers
//!
//! Shared by both loops. Every mutation is read-modify-persist under one
//! mutex and the file is replaced atomically, so concurrent writers never
//! lose each other's updates.

use crate::error::StorageError;
use crate::fsutil::atomic_write;
use chrono::{DateTime, Utc};
use frd_core::unix_seconds;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

pub const LAST_SNAPSHOT_TIME: &str = "last_snapshot_time";
pub const LAST_REPLICA_TIME: &str = "last_replica_time";
pub const LAST_SYNC_TIME: &str = "last_sync_time";

/// Key/value run-state backed by a JSON file
#[derive(Debug)]
pub struct RunState {
    path: PathBuf,
    values: Mutex<BTreeMap<String, Value>>,
}

impl RunState {
    /// Load from `path`. A missing file starts empty; an unreadable one is
    /// logged and starts empty, and is replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let values = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "run-state unreadable, starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Copy of every entry
    pub fn entries(&self) -> BTreeMap<String, Value> {
        self.lock().clone()
    }

    /// Timestamp stored under `key` as unix seconds
    pub fn last_run(&self, key: &str) -> Option<DateTime<Utc>> {
        let seconds = self.get(key)?.as_f64()?;
        DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
    }

    pub fn record_run(&self, key: &str, at: DateTime<Utc>) -> Result<(), StorageError> {
        self.set(key, unix_seconds(at))
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), StorageError> {
        let value = value.into();
        self.update(key, |_| value).map(|_| ())
    }

    /// Replace `key` with `f(current)` and persist, as one critical section.
    /// If persisting fails the in-memory map is left unchanged.
    pub fn update<F>(&self, key: &str, f: F) -> Result<Value, StorageError>
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        let mut values = self.lock();
        let next = f(values.get(key));
        let mut staged = values.clone();
        staged.insert(key.to_string(), next.clone());
        self.persist(&staged)?;
        *values = staged;
        Ok(next)
    }

    fn persist(&self, values: &BTreeMap<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(values)?;
        atomic_write(&self.path, &bytes)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Value>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// True when `interval` has elapsed since `last` (or it never ran)
pub fn is_due(last: Option<DateTime<Utc>>, interval: Duration, now: DateTime<Utc>) -> bool {
    let Some(last) = last else {
        return true;
    };
    match chrono::Duration::from_std(interval) {
        Ok(interval) => now.signed_duration_since(last) >= interval,
        Err(_) => false,
    }
}

#[cfg(test)]
#[path = "run_state_tests.rs"]
mod tests;

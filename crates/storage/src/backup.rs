// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot and replica management
//!
//! Layout under the backups directory:
//! - `snapshots/<store-id>_snapshot_<YYYYMMDD_HHMMSS>.db` (UTC, immutable)
//! - `replicas/<store-id>` (single rolling mirror, overwritten)
//!
//! Every copy goes through a temp file and rename, so no reader sees a
//! partially written snapshot, replica, or restored store.

use crate::error::StorageError;
use crate::fsutil::{atomic_copy, remove_sidecars};
use crate::registry::StoreRegistry;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const SNAPSHOT_MARKER: &str = "_snapshot_";
const SNAPSHOT_EXT: &str = ".db";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A point-in-time copy of a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub store_id: String,
    pub created_at: DateTime<Utc>,
    pub path: PathBuf,
}

impl Snapshot {
    /// True when `now - created_at >= max_age`
    pub fn is_expired(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        let Ok(max_age) = chrono::Duration::from_std(max_age) else {
            return false;
        };
        now.signed_duration_since(self.created_at) >= max_age
    }
}

/// Result of a prune sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub removed: usize,
    pub failed: usize,
    pub kept: usize,
}

impl PruneReport {
    pub fn merge(&mut self, other: PruneReport) {
        self.removed += other.removed;
        self.failed += other.failed;
        self.kept += other.kept;
    }
}

/// Creates, lists, prunes and restores snapshots and replicas
#[derive(Debug, Clone)]
pub struct BackupManager {
    registry: Arc<StoreRegistry>,
    snapshots_dir: PathBuf,
    replicas_dir: PathBuf,
}

impl BackupManager {
    /// Manager rooted at `backups_dir` (holding `snapshots/` and `replicas/`)
    pub fn new(registry: Arc<StoreRegistry>, backups_dir: &Path) -> Self {
        Self {
            registry,
            snapshots_dir: backups_dir.join("snapshots"),
            replicas_dir: backups_dir.join("replicas"),
        }
    }

    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    pub fn snapshots_dir(&self) -> &Path {
        &self.snapshots_dir
    }

    pub fn replicas_dir(&self) -> &Path {
        &self.replicas_dir
    }

    /// Ensure both backup directories exist
    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.snapshots_dir)?;
        std::fs::create_dir_all(&self.replicas_dir)?;
        Ok(())
    }

    pub fn snapshot_path(&self, store_id: &str, at: DateTime<Utc>) -> PathBuf {
        self.snapshots_dir.join(format!(
            "{store_id}{SNAPSHOT_MARKER}{}{SNAPSHOT_EXT}",
            at.format(STAMP_FORMAT)
        ))
    }

    pub fn replica_path(&self, store_id: &str) -> PathBuf {
        self.replicas_dir.join(store_id)
    }

    pub fn has_replica(&self, store_id: &str) -> bool {
        self.replica_path(store_id).is_file()
    }

    /// Copy the live store into a new timestamped snapshot
    pub fn create_snapshot(
        &self,
        store_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Snapshot, StorageError> {
        let live = self.live_path(store_id)?;
        std::fs::create_dir_all(&self.snapshots_dir)?;
        let path = self.snapshot_path(store_id, now);
        let bytes = atomic_copy(&live, &path)?;
        info!(store = store_id, path = %path.display(), bytes, "snapshot created");
        Ok(Snapshot {
            store_id: store_id.to_string(),
            created_at: truncate_to_second(now),
            path,
        })
    }

    /// Overwrite the store's replica with the live store
    pub fn create_replica(&self, store_id: &str) -> Result<PathBuf, StorageError> {
        let live = self.live_path(store_id)?;
        std::fs::create_dir_all(&self.replicas_dir)?;
        let path = self.replica_path(store_id);
        let bytes = atomic_copy(&live, &path)?;
        info!(store = store_id, bytes, "replica refreshed");
        Ok(path)
    }

    /// Snapshots of one store, newest first
    pub fn list_snapshots(&self, store_id: &str) -> Result<Vec<Snapshot>, StorageError> {
        self.registry.get(store_id)?;
        let entries = match std::fs::read_dir(&self.snapshots_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let prefix = format!("{store_id}{SNAPSHOT_MARKER}");
        let mut snapshots = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(stamp) = name
                .to_str()
                .and_then(|n| n.strip_prefix(&prefix))
                .and_then(|n| n.strip_suffix(SNAPSHOT_EXT))
            else {
                continue;
            };
            let created_at = match parse_stamp(stamp) {
                Some(at) => at,
                None => match entry.metadata().and_then(|m| m.modified()) {
                    Ok(mtime) => DateTime::<Utc>::from(mtime),
                    Err(e) => {
                        warn!(path = %entry.path().display(), error = %e, "unreadable snapshot, ignoring");
                        continue;
                    }
                },
            };
            snapshots.push(Snapshot {
                store_id: store_id.to_string(),
                created_at,
                path: entry.path(),
            });
        }

        snapshots.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.path.cmp(&a.path))
        });
        Ok(snapshots)
    }

    /// Delete snapshots at least `max_age` old. Per-file failures are logged
    /// and counted; the sweep continues.
    pub fn prune_snapshots(
        &self,
        store_id: &str,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<PruneReport, StorageError> {
        let mut report = PruneReport::default();
        for snapshot in self.list_snapshots(store_id)? {
            if !snapshot.is_expired(max_age, now) {
                report.kept += 1;
                continue;
            }
            match std::fs::remove_file(&snapshot.path) {
                Ok(()) => {
                    debug!(path = %snapshot.path.display(), "pruned snapshot");
                    report.removed += 1;
                }
                Err(e) => {
                    warn!(path = %snapshot.path.display(), error = %e, "failed to prune snapshot");
                    report.failed += 1;
                }
            }
        }
        if report.removed > 0 {
            info!(store = store_id, removed = report.removed, "pruned expired snapshots");
        }
        Ok(report)
    }

    /// Prune every registered store; a store whose listing fails is counted
    /// as one failure and the sweep moves on
    pub fn prune_all(&self, max_age: Duration, now: DateTime<Utc>) -> PruneReport {
        let mut total = PruneReport::default();
        for id in self.registry.ids() {
            match self.prune_snapshots(id, max_age, now) {
                Ok(report) => total.merge(report),
                Err(e) => {
                    warn!(store = id, error = %e, "snapshot sweep failed");
                    total.failed += 1;
                }
            }
        }
        total
    }

    /// Copy the replica over the live store
    pub fn restore_from_replica(&self, store_id: &str) -> Result<(), StorageError> {
        let replica = self.replica_path(store_id);
        if !replica.is_file() {
            return Err(StorageError::NoReplica(store_id.to_string()));
        }
        self.restore_file(store_id, &replica)?;
        info!(store = store_id, "restored from replica");
        Ok(())
    }

    /// Copy the `index`-th newest snapshot over the live store
    pub fn restore_from_snapshot(
        &self,
        store_id: &str,
        index: usize,
    ) -> Result<Snapshot, StorageError> {
        let snapshot = self
            .list_snapshots(store_id)?
            .into_iter()
            .nth(index)
            .ok_or_else(|| StorageError::NoSnapshot {
                store: store_id.to_string(),
                index,
            })?;
        self.restore_snapshot(&snapshot)?;
        Ok(snapshot)
    }

    /// Copy a specific snapshot over its store
    pub fn restore_snapshot(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        self.restore_file(&snapshot.store_id, &snapshot.path)?;
        info!(
            store = %snapshot.store_id,
            snapshot = %snapshot.path.display(),
            "restored from snapshot"
        );
        Ok(())
    }

    fn restore_file(&self, store_id: &str, source: &Path) -> Result<(), StorageError> {
        let live = self.registry.path_of(store_id)?;
        std::fs::create_dir_all(self.registry.data_dir())?;
        let removed = remove_sidecars(&live)?;
        if removed > 0 {
            warn!(store = store_id, removed, "discarded stale journal files");
        }
        atomic_copy(source, &live)?;
        Ok(())
    }

    fn live_path(&self, store_id: &str) -> Result<PathBuf, StorageError> {
        let live = self.registry.path_of(store_id)?;
        if !live.is_file() {
            return Err(StorageError::MissingStore(live));
        }
        Ok(live)
    }
}

fn parse_stamp(stamp: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn truncate_to_second(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Store files and their protection: registry, integrity checks, snapshots,
//! replicas, recovery, run-state and the room store accessor.

mod backup;
mod error;
mod fsutil;
mod integrity;
mod migrate;
mod recovery;
mod registry;
mod rooms;
mod run_state;

pub use backup::{BackupManager, PruneReport, Snapshot};
pub use error::StorageError;
pub use fsutil::{atomic_copy, atomic_write, remove_sidecars};
pub use integrity::{Health, IntegrityCheck, SqliteIntegrityChecker};
pub use migrate::{migrate_store, MigrationReport};
pub use recovery::{RecoveryOrchestrator, RecoveryOutcome, RestoreSource};
pub use registry::{
    default_stores, StoreDef, StoreRegistry, TableDef, BOT_STORE, ROOM_STORE, SCANNER_STORE,
};
pub use rooms::{HistoryPolicy, RoomStore};
pub use run_state::{is_due, RunState, LAST_REPLICA_TIME, LAST_SNAPSHOT_TIME, LAST_SYNC_TIME};

#[cfg(test)]
mod test_support;

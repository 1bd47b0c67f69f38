// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery orchestrator
//!
//! Walks the recovery chain for a store that failed its integrity check,
//! re-checking after every restore. Exhausting the chain is reported as an
//! outcome, never as a process failure.

use crate::backup::{BackupManager, Snapshot};
use crate::error::StorageError;
use crate::integrity::{Health, IntegrityCheck};
use frd_core::{RecoveryAction, RecoveryConfig, RecoveryState};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Where a successful restore came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreSource {
    Replica,
    Snapshot { index: usize, path: PathBuf },
}

/// Final state of one recovery run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The store passed its check; nothing was restored
    Healthy,
    Restored {
        source: RestoreSource,
        attempts: usize,
    },
    /// Every candidate was tried; the store is left as last restored
    Unrecovered {
        attempts: usize,
        last_error: Option<String>,
    },
}

impl RecoveryOutcome {
    pub fn is_healthy(&self) -> bool {
        !matches!(self, RecoveryOutcome::Unrecovered { .. })
    }
}

/// Runs integrity checks and the recovery chain
pub struct RecoveryOrchestrator<K> {
    backups: BackupManager,
    checker: K,
    config: RecoveryConfig,
}

impl<K: IntegrityCheck> RecoveryOrchestrator<K> {
    pub fn new(backups: BackupManager, checker: K, config: RecoveryConfig) -> Self {
        Self {
            backups,
            checker,
            config,
        }
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Check the live store file
    pub fn check(&self, store_id: &str) -> Result<Health, StorageError> {
        let path = self.backups.registry().path_of(store_id)?;
        Ok(self.checker.check(&path))
    }

    /// Check, and run the chain only if the store is unhealthy
    pub fn check_and_recover(&self, store_id: &str) -> Result<RecoveryOutcome, StorageError> {
        match self.check(store_id)? {
            Health::Healthy => Ok(RecoveryOutcome::Healthy),
            Health::Corrupt(detail) => {
                warn!(store = store_id, detail = %detail, "integrity check failed");
                self.recover(store_id)
            }
        }
    }

    /// Run the chain: replica, then snapshots newest-first, up to the bound
    pub fn recover(&self, store_id: &str) -> Result<RecoveryOutcome, StorageError> {
        let live = self.backups.registry().path_of(store_id)?;
        let snapshots = self.backups.list_snapshots(store_id).unwrap_or_else(|e| {
            warn!(store = store_id, error = %e, "could not list snapshots");
            Vec::new()
        });
        let replica_available = self.backups.has_replica(store_id);

        let mut state = RecoveryState::default();
        let mut last_error = None;
        loop {
            let action = state.next_action(&self.config, replica_available, snapshots.len());
            let restored = match action {
                RecoveryAction::RestoreReplica => self
                    .backups
                    .restore_from_replica(store_id)
                    .map(|()| RestoreSource::Replica),
                RecoveryAction::RestoreSnapshot { index } => {
                    self.restore_indexed(store_id, &snapshots, index)
                }
                RecoveryAction::Escalate => {
                    error!(
                        alarm = "unrecovered_corruption",
                        store = store_id,
                        attempts = state.attempts(),
                        "store could not be recovered"
                    );
                    return Ok(RecoveryOutcome::Unrecovered {
                        attempts: state.attempts(),
                        last_error,
                    });
                }
            };
            state.record(action);

            match restored {
                Ok(source) => match self.checker.check(&live) {
                    Health::Healthy => {
                        info!(store = store_id, ?source, "store recovered");
                        return Ok(RecoveryOutcome::Restored {
                            source,
                            attempts: state.attempts(),
                        });
                    }
                    Health::Corrupt(detail) => {
                        warn!(store = store_id, ?source, detail = %detail, "restored copy is also corrupt");
                        last_error = Some(detail);
                    }
                },
                Err(e) => {
                    warn!(store = store_id, ?action, error = %e, "restore attempt failed");
                    last_error = Some(e.to_string());
                }
            }
        }
    }

    fn restore_indexed(
        &self,
        store_id: &str,
        snapshots: &[Snapshot],
        index: usize,
    ) -> Result<RestoreSource, StorageError> {
        let snapshot = snapshots.get(index).ok_or_else(|| StorageError::NoSnapshot {
            store: store_id.to_string(),
            index,
        })?;
        self.backups.restore_snapshot(snapshot)?;
        Ok(RestoreSource::Snapshot {
            index,
            path: snapshot.path.clone(),
        })
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;

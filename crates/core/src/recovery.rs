// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery decision chain for a store that failed its integrity check
//!
//! The chain is: replica once, then snapshots newest-first up to a bound,
//! then escalate. Execution lives in the storage crate; this is only the
//! decision of what to try next.

/// Configuration for the recovery chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryConfig {
    /// Maximum snapshot restores before escalating
    pub max_snapshot_attempts: usize,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_snapshot_attempts: 3,
        }
    }
}

/// Attempts made so far for one store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryState {
    pub replica_tried: bool,
    pub snapshots_tried: usize,
}

/// The next step for a corrupt store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Copy the replica over the live store
    RestoreReplica,
    /// Copy the snapshot at `index` (0 = newest) over the live store
    RestoreSnapshot { index: usize },
    /// Every candidate has been tried
    Escalate,
}

impl RecoveryState {
    /// Decide the next action given what exists on disk
    pub fn next_action(
        &self,
        config: &RecoveryConfig,
        replica_available: bool,
        snapshots_available: usize,
    ) -> RecoveryAction {
        if !self.replica_tried && replica_available {
            return RecoveryAction::RestoreReplica;
        }

        let budget = config.max_snapshot_attempts.min(snapshots_available);
        if self.snapshots_tried < budget {
            return RecoveryAction::RestoreSnapshot {
                index: self.snapshots_tried,
            };
        }

        RecoveryAction::Escalate
    }

    /// Record that an action was carried out (successful or not)
    pub fn record(&mut self, action: RecoveryAction) {
        match action {
            RecoveryAction::RestoreReplica => self.replica_tried = true,
            RecoveryAction::RestoreSnapshot { .. } => self.snapshots_tried += 1,
            RecoveryAction::Escalate => {}
        }
    }

    pub fn attempts(&self) -> usize {
        usize::from(self.replica_tried) + self.snapshots_tried
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;

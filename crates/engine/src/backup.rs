// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backup scheduler
//!
//! Each tick checks every store (recovering the unhealthy ones), then creates
//! snapshots and replicas when their persisted last-run timestamps say they
//! are due, then sweeps expired snapshots. Polling against persisted
//! timestamps means a restart does not re-trigger work that already ran,
//! and missed ticks catch up on the next one.

use crate::events::EngineEvent;
use chrono::{DateTime, Utc};
use frd_core::{BackupConfig, Clock, IdGen};
use frd_storage::{
    is_due, BackupManager, IntegrityCheck, PruneReport, RecoveryOrchestrator, RecoveryOutcome,
    RunState, LAST_REPLICA_TIME, LAST_SNAPSHOT_TIME,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, info_span, warn};

/// Outcome of one snapshot or replica round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub created: Vec<String>,
    pub failed: Vec<String>,
    /// Stores left out because they were unhealthy this tick
    pub excluded: Vec<String>,
}

/// Outcome of one scheduler tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub tick_id: String,
    pub checked: usize,
    pub recovered: Vec<String>,
    pub unrecovered: Vec<String>,
    /// `None` when snapshots were not due
    pub snapshots: Option<PassReport>,
    /// `None` when replicas were not due
    pub replicas: Option<PassReport>,
    pub pruned: PruneReport,
}

#[derive(Clone, Copy)]
enum Round {
    Snapshot,
    Replica,
}

impl Round {
    fn key(self) -> &'static str {
        match self {
            Round::Snapshot => LAST_SNAPSHOT_TIME,
            Round::Replica => LAST_REPLICA_TIME,
        }
    }
}

/// Drives integrity checks, recovery, snapshots, replicas and pruning
pub struct BackupScheduler<K, C, I> {
    recovery: RecoveryOrchestrator<K>,
    run_state: Arc<RunState>,
    config: BackupConfig,
    clock: C,
    ids: I,
}

impl<K, C, I> BackupScheduler<K, C, I>
where
    K: IntegrityCheck,
    C: Clock,
    I: IdGen,
{
    pub fn new(
        recovery: RecoveryOrchestrator<K>,
        run_state: Arc<RunState>,
        config: BackupConfig,
        clock: C,
        ids: I,
    ) -> Self {
        Self {
            recovery,
            run_state,
            config,
            clock,
            ids,
        }
    }

    pub fn backups(&self) -> &BackupManager {
        self.recovery.backups()
    }

    pub fn recovery(&self) -> &RecoveryOrchestrator<K> {
        &self.recovery
    }

    /// Run one tick. Blocking: performs file copies and SQLite checks.
    pub fn tick(&self) -> TickReport {
        let tick_id = self.ids.next();
        let span = info_span!("backup.tick", tick = %tick_id);
        let _guard = span.enter();

        let mut report = TickReport {
            tick_id: tick_id.clone(),
            ..TickReport::default()
        };

        // Check and recover every store before any of them is copied
        let mut healthy = Vec::new();
        for id in self.backups().registry().ids() {
            report.checked += 1;
            match self.recovery.check_and_recover(id) {
                Ok(RecoveryOutcome::Healthy) => healthy.push(id.to_string()),
                Ok(RecoveryOutcome::Restored { source, attempts }) => {
                    info!(store = id, ?source, attempts, "store recovered");
                    report.recovered.push(id.to_string());
                    healthy.push(id.to_string());
                }
                Ok(RecoveryOutcome::Unrecovered { .. }) => {
                    report.unrecovered.push(id.to_string());
                }
                Err(e) => {
                    error!(store = id, error = %e, "integrity check could not run");
                    report.unrecovered.push(id.to_string());
                }
            }
        }

        let now = self.clock.now();
        report.snapshots = self.round_if_due(
            Round::Snapshot,
            self.config.snapshot_interval,
            now,
            &healthy,
            &report.unrecovered,
        );
        report.replicas = self.round_if_due(
            Round::Replica,
            self.config.replica_interval,
            now,
            &healthy,
            &report.unrecovered,
        );

        report.pruned = self
            .backups()
            .prune_all(self.config.snapshot_max_age, now);
        report
    }

    fn round_if_due(
        &self,
        round: Round,
        interval: Duration,
        now: DateTime<Utc>,
        healthy: &[String],
        unhealthy: &[String],
    ) -> Option<PassReport> {
        if !is_due(self.run_state.last_run(round.key()), interval, now) {
            return None;
        }

        let mut pass = PassReport {
            excluded: unhealthy.to_vec(),
            ..PassReport::default()
        };
        for id in healthy {
            let result = match round {
                Round::Snapshot => self.backups().create_snapshot(id, now).map(|_| ()),
                Round::Replica => self.backups().create_replica(id).map(|_| ()),
            };
            match result {
                Ok(()) => pass.created.push(id.clone()),
                Err(e) => {
                    warn!(store = %id, key = round.key(), error = %e, "backup copy failed");
                    pass.failed.push(id.clone());
                }
            }
        }

        // Advance even on partial failure; failed stores retry next interval
        if let Err(e) = self.run_state.record_run(round.key(), now) {
            error!(key = round.key(), error = %e, "failed to persist run state");
        }
        Some(pass)
    }

    /// Tick every `tick` until shutdown is signalled.
    ///
    /// A tick in progress runs to completion on the blocking pool; shutdown
    /// is observed between ticks.
    pub async fn run(
        self: Arc<Self>,
        tick: Duration,
        mut shutdown: watch::Receiver<bool>,
        events: mpsc::Sender<EngineEvent>,
    ) {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }

            let scheduler = Arc::clone(&self);
            let report = match tokio::task::spawn_blocking(move || scheduler.tick()).await {
                Ok(report) => report,
                Err(e) => {
                    error!(error = %e, "backup tick panicked");
                    continue;
                }
            };

            let mut batch: Vec<EngineEvent> = report
                .unrecovered
                .iter()
                .map(|store| EngineEvent::StoreUnrecovered {
                    store: store.clone(),
                })
                .collect();
            batch.push(EngineEvent::TickCompleted(report));
            for event in batch {
                if events.send(event).await.is_err() {
                    return;
                }
            }
        }
        info!("backup scheduler stopped");
    }
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, event reporting.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use frd_adapters::{HttpRemoteAdapter, RemoteAdapter, RemoteError, TracedRemoteAdapter};
use frd_core::{Config, ConfigError, SystemClock, UuidIdGen};
use frd_engine::{BackupScheduler, EngineEvent, Reconciler};
use frd_storage::{
    BackupManager, RecoveryOrchestrator, RunState, SqliteIntegrityChecker, StorageError,
    StoreRegistry,
};
use fs2::FileExt;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Remote adapter the daemon uses outside of tests
pub type DaemonRemote = TracedRemoteAdapter<HttpRemoteAdapter>;

/// Capacity of the loop-to-host event channel
const EVENT_BUFFER: usize = 64;

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Events reported by the loops
    pub events: mpsc::Receiver<EngineEvent>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    pub start_time: Instant,
}

impl DaemonState {
    /// Names of the loops that were started
    pub fn loops(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|(name, _)| *name).collect()
    }

    /// Stop both loops, wait for them, and remove the PID file
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // 1. Signal the loops; a tick in progress finishes its current step
        let _ = self.shutdown.send(true);

        // 2. Wait for them
        for (name, task) in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!(task = name, error = %e, "loop ended abnormally");
            }
        }

        // 3. Remove PID file
        let lock_path = self.config.paths.lock_path();
        if lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // 4. Lock file is released automatically when self.lock_file is dropped

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon with the configured HTTP remote, if any
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    let remote = match HttpRemoteAdapter::from_config(&config.remote, config.sync.min_assets) {
        Ok(http) => Some(TracedRemoteAdapter::new(http)),
        Err(RemoteError::NotConfigured) => None,
        Err(e) => {
            warn!(error = %e, "remote adapter unavailable");
            None
        }
    };
    startup_with_remote(config, remote).await
}

/// Start the daemon against an explicit remote; `None` disables sync
pub async fn startup_with_remote<R: RemoteAdapter>(
    config: &Config,
    remote: Option<R>,
) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config, remote).await {
        Ok(state) => Ok(state),
        // Another daemon owns the PID file; leave it alone
        Err(e @ LifecycleError::LockFailed(_)) => Err(e),
        Err(e) => {
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner<R: RemoteAdapter>(
    config: &Config,
    remote: Option<R>,
) -> Result<DaemonState, LifecycleError> {
    let paths = &config.paths;

    // 1. Acquire lock file FIRST - prevents two daemons racing on the stores
    std::fs::create_dir_all(&paths.state_dir)?;
    let mut lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(paths.lock_path())?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 2. Registry: create missing stores. Existing files are left for the
    // scheduler to check, so a corrupt store never blocks startup.
    let registry = Arc::new(StoreRegistry::with_default_stores(&paths.data_dir)?);
    for id in registry.ids() {
        if !registry.path_of(id)?.exists() {
            registry.init_store(id)?;
            info!(store = id, "created store");
        }
    }

    // 3. Run-state shared by both loops
    let run_state = Arc::new(RunState::open(paths.run_state_path())?);

    let (events_tx, events) = mpsc::channel(EVENT_BUFFER);
    let (shutdown, shutdown_rx) = watch::channel(false);
    let mut tasks = Vec::new();

    // 4. Backup scheduler
    if config.backup.enabled {
        let backups = BackupManager::new(Arc::clone(&registry), &paths.backups_dir);
        backups.ensure_dirs()?;
        let recovery = RecoveryOrchestrator::new(
            backups,
            SqliteIntegrityChecker::new(),
            config.backup.recovery(),
        );
        let scheduler = Arc::new(BackupScheduler::new(
            recovery,
            Arc::clone(&run_state),
            config.backup.clone(),
            SystemClock,
            UuidIdGen,
        ));
        let task = tokio::spawn(scheduler.run(
            config.backup.tick,
            shutdown_rx.clone(),
            events_tx.clone(),
        ));
        tasks.push(("backup", task));
    }

    // 5. Reconciliation loop
    match (config.sync.enabled, remote) {
        (true, Some(remote)) => {
            let reconciler = Arc::new(
                Reconciler::new(
                    remote,
                    registry.rooms()?,
                    Arc::clone(&run_state),
                    SystemClock,
                    UuidIdGen,
                )
                .with_policy(config.sync.asset_policy()),
            );
            let task = tokio::spawn(reconciler.run(
                config.sync.interval,
                shutdown_rx.clone(),
                events_tx.clone(),
            ));
            tasks.push(("sync", task));
        }
        (true, None) => warn!("sync enabled but no remote configured; reconciliation disabled"),
        (false, _) => info!("reconciliation disabled"),
    }

    info!(
        data_dir = %paths.data_dir.display(),
        loops = tasks.len(),
        "Daemon started"
    );

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        events,
        shutdown,
        tasks,
        start_time: Instant::now(),
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    let lock_path = config.paths.lock_path();
    if lock_path.exists() {
        let _ = std::fs::remove_file(&lock_path);
    }
}

/// Write one loop event to the log
pub fn log_event(event: &EngineEvent) {
    match event {
        EngineEvent::TickCompleted(report) => {
            let snapshots = report.snapshots.as_ref().map(|p| p.created.len());
            let replicas = report.replicas.as_ref().map(|p| p.created.len());
            info!(
                event = event.name(),
                tick = %report.tick_id,
                checked = report.checked,
                recovered = report.recovered.len(),
                snapshots = ?snapshots,
                replicas = ?replicas,
                pruned = report.pruned.removed,
                "backup tick"
            );
        }
        EngineEvent::StoreUnrecovered { store } => {
            error!(event = event.name(), store = %store, "store remains corrupt");
        }
        EngineEvent::SyncCompleted(summary) => {
            info!(event = event.name(), %summary, "sync pass");
        }
        EngineEvent::SyncAborted { reason } => {
            warn!(event = event.name(), reason = %reason, "sync pass aborted");
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

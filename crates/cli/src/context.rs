// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage and engine wiring shared by CLI commands

use crate::error::FrdError;
use anyhow::{Context as _, Result};
use frd_adapters::{HttpRemoteAdapter, RemoteError, TracedRemoteAdapter};
use frd_core::{Config, SystemClock, UuidIdGen};
use frd_engine::{BackupScheduler, Reconciler};
use frd_storage::{
    BackupManager, RecoveryOrchestrator, RunState, SqliteIntegrityChecker, StoreRegistry,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "frd.toml";

pub type CliScheduler = BackupScheduler<SqliteIntegrityChecker, SystemClock, UuidIdGen>;
pub type CliReconciler = Reconciler<TracedRemoteAdapter<HttpRemoteAdapter>, SystemClock, UuidIdGen>;

/// Everything a command needs, built from one config file
pub struct Context {
    pub config: Config,
    pub registry: Arc<StoreRegistry>,
}

impl Context {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.join(DEFAULT_CONFIG_FILE));
        let config = if config_path.is_some() {
            Config::load(&path)
        } else {
            Config::load_or_default(&path, &cwd)
        }
        .with_context(|| format!("loading {}", path.display()))?;
        let registry = StoreRegistry::with_default_stores(&config.paths.data_dir)?;
        tracing::debug!(data_dir = %config.paths.data_dir.display(), "context loaded");
        Ok(Self {
            config,
            registry: Arc::new(registry),
        })
    }

    /// The named store, or every registered store when `None`
    pub fn store_ids(&self, store: Option<&str>) -> Result<Vec<String>> {
        match store {
            Some(id) => {
                if self.registry.get(id).is_err() {
                    let known: Vec<&str> = self.registry.ids().collect();
                    return Err(FrdError::unknown_store(id, &known).into());
                }
                Ok(vec![id.to_string()])
            }
            None => Ok(self.registry.ids().map(str::to_string).collect()),
        }
    }

    pub fn store_path(&self, id: &str) -> Result<PathBuf> {
        Ok(self.registry.path_of(id)?)
    }

    pub fn backups(&self) -> BackupManager {
        BackupManager::new(Arc::clone(&self.registry), &self.config.paths.backups_dir)
    }

    pub fn recovery(&self) -> RecoveryOrchestrator<SqliteIntegrityChecker> {
        RecoveryOrchestrator::new(
            self.backups(),
            SqliteIntegrityChecker::new(),
            self.config.backup.recovery(),
        )
    }

    pub fn run_state(&self) -> Result<Arc<RunState>> {
        Ok(Arc::new(RunState::open(self.config.paths.run_state_path())?))
    }

    pub fn scheduler(&self) -> Result<CliScheduler> {
        Ok(BackupScheduler::new(
            self.recovery(),
            self.run_state()?,
            self.config.backup.clone(),
            SystemClock,
            UuidIdGen,
        ))
    }

    pub fn reconciler(&self) -> Result<CliReconciler> {
        let remote = match HttpRemoteAdapter::from_config(
            &self.config.remote,
            self.config.sync.min_assets,
        ) {
            Ok(remote) => remote,
            Err(RemoteError::NotConfigured) => return Err(FrdError::remote_not_configured().into()),
            Err(e) => return Err(e.into()),
        };
        Ok(Reconciler::new(
            TracedRemoteAdapter::new(remote),
            self.registry.rooms()?,
            self.run_state()?,
            SystemClock,
            UuidIdGen,
        )
        .with_policy(self.config.sync.asset_policy()))
    }

    /// PID recorded by a running daemon, if any
    pub fn daemon_pid(&self) -> Option<u32> {
        let content = std::fs::read_to_string(self.config.paths.lock_path()).ok()?;
        content.trim().parse().ok()
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration file loading
//!
//! One TOML file configures both loops. Every field has a default, durations
//! use humantime notation (`"10s"`, `"6h"`, `"3days"`), and relative paths
//! resolve against the directory holding the file.

use crate::asset::AssetPolicy;
use crate::recovery::RecoveryConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable consulted when `remote.api_key` is absent
pub const API_KEY_ENV: &str = "FRD_API_KEY";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("invalid config {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub paths: PathsConfig,
    pub backup: BackupConfig,
    pub sync: SyncConfig,
    pub remote: RemoteConfig,
}

/// Filesystem layout
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory holding the store files
    pub data_dir: PathBuf,
    /// Directory holding `snapshots/` and `replicas/`
    pub backups_dir: PathBuf,
    /// Run-state, lock and log files
    pub state_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            backups_dir: PathBuf::from("backups"),
            state_dir: PathBuf::from(".frd"),
        }
    }
}

impl PathsConfig {
    pub fn snapshots_dir(&self) -> PathBuf {
        self.backups_dir.join("snapshots")
    }

    pub fn replicas_dir(&self) -> PathBuf {
        self.backups_dir.join("replicas")
    }

    pub fn run_state_path(&self) -> PathBuf {
        self.state_dir.join("run_state.json")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.state_dir.join("daemon.pid")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join("daemon.log")
    }

    fn resolve(&mut self, base: &Path) {
        for path in [
            &mut self.data_dir,
            &mut self.backups_dir,
            &mut self.state_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Backup scheduler settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupConfig {
    pub enabled: bool,
    /// Polling tick for integrity checks
    #[serde(with = "humantime_serde")]
    pub tick: Duration,
    #[serde(with = "humantime_serde")]
    pub snapshot_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub replica_interval: Duration,
    /// Snapshots at least this old are pruned
    #[serde(with = "humantime_serde")]
    pub snapshot_max_age: Duration,
    pub max_snapshot_attempts: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick: Duration::from_secs(10),
            snapshot_interval: Duration::from_secs(6 * 3600),
            replica_interval: Duration::from_secs(30 * 60),
            snapshot_max_age: Duration::from_secs(3 * 86_400),
            max_snapshot_attempts: 3,
        }
    }
}

impl BackupConfig {
    pub fn recovery(&self) -> RecoveryConfig {
        RecoveryConfig {
            max_snapshot_attempts: self.max_snapshot_attempts,
        }
    }
}

/// Reconciliation loop settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub enabled: bool,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    pub min_assets: usize,
    pub max_upload_assets: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let policy = AssetPolicy::default();
        Self {
            enabled: true,
            interval: Duration::from_secs(3600),
            min_assets: policy.min_valid,
            max_upload_assets: policy.max_upload,
        }
    }
}

impl SyncConfig {
    pub fn asset_policy(&self) -> AssetPolicy {
        AssetPolicy::new(self.min_assets, self.max_upload_assets)
    }
}

/// Remote archive endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub export_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout: Duration::from_secs(30),
            export_timeout: Duration::from_secs(60),
        }
    }
}

/// Base URL and key, present only when the remote is fully configured
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    pub base_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for RemoteCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCredentials")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl RemoteConfig {
    pub fn credentials(&self) -> Option<RemoteCredentials> {
        let base_url = self.base_url.as_deref().map(str::trim).unwrap_or_default();
        let api_key = self.api_key.as_deref().map(str::trim).unwrap_or_default();
        if base_url.is_empty() || api_key.is_empty() {
            return None;
        }
        Some(RemoteCredentials {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

impl Config {
    /// Load from a file, resolving paths and applying environment fallbacks
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.finish(base, |key| std::env::var(key).ok())?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load if the file exists, otherwise defaults rooted at `base`
    pub fn load_or_default(path: &Path, base: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load(path);
        }
        let mut config = Config::default();
        config.finish(base, |key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse from a string; used by tests and embedded defaults
    pub fn from_toml_str(
        content: &str,
        base: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.finish(base, env)?;
        Ok(config)
    }

    fn finish(
        &mut self,
        base: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        self.paths.resolve(base);
        if self.remote.api_key.is_none() {
            self.remote.api_key = env(API_KEY_ENV);
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.backup.tick.is_zero() {
            return Err(ConfigError::Invalid("backup.tick must be non-zero".into()));
        }
        if self.sync.interval.is_zero() {
            return Err(ConfigError::Invalid("sync.interval must be non-zero".into()));
        }
        if self.sync.max_upload_assets == 0 {
            return Err(ConfigError::Invalid(
                "sync.max_upload_assets must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! frd-core: pure types and decisions shared by the store keeper
//!
//! This crate provides:
//! - The room entity model and its edit history
//! - Wall-clock and identifier abstractions for deterministic tests
//! - Configuration loading
//! - The asset gate and last-write-wins classification used by reconciliation
//! - The recovery decision state machine used when a store fails its check

pub mod asset;
pub mod clock;
pub mod config;
pub mod id;
pub mod reconcile;
pub mod recovery;
pub mod room;

pub use asset::{is_http_url, AssetPolicy, AssetVerdict};
pub use clock::{unix_seconds, Clock, FakeClock, SystemClock};
pub use config::{
    BackupConfig, Config, ConfigError, PathsConfig, RemoteConfig, RemoteCredentials, SyncConfig,
};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use reconcile::{Disposition, Outcome, ReconcilePlan, ReconcileSummary};
pub use recovery::{RecoveryAction, RecoveryConfig, RecoveryState};
pub use room::{merge_history, EditRecord, RoomDoc};

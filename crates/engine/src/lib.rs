// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The two periodic loops: backup scheduling and remote reconciliation

mod backup;
mod error;
mod events;
mod reconcile;

pub use backup::{BackupScheduler, PassReport, TickReport};
pub use error::EngineError;
pub use events::EngineEvent;
pub use reconcile::{MirrorReport, Reconciler};

#[cfg(test)]
mod test_support;

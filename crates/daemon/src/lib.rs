// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Store keeper daemon library: lifecycle for the `frdd` binary

pub mod lifecycle;

pub use lifecycle::{
    log_event, startup, startup_with_remote, DaemonRemote, DaemonState, LifecycleError,
};

/// Startup marker prefix written to log before anything else.
/// Full format: "--- frdd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- frdd: starting (pid: ";

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "frd.toml";

/// Environment variable naming the config file when no argument is given
pub const CONFIG_ENV: &str = "FRD_CONFIG";

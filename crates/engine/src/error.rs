// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use frd_adapters::RemoteError;
use frd_storage::StorageError;
use thiserror::Error;

/// Errors that abort a whole pass
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("background task failed: {0}")]
    Task(String),
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use thiserror::Error;

/// Errors from store file operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown store: {0}")]
    UnknownStore(String),

    #[error("invalid store definition: {0}")]
    InvalidStore(String),

    #[error("no replica for {0}")]
    NoReplica(String),

    #[error("no snapshot #{index} for {store}")]
    NoSnapshot { store: String, index: usize },

    #[error("store file missing: {0}")]
    MissingStore(PathBuf),
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integrity checker
//!
//! Opens a store read-only and runs a bounded self-consistency check. A file
//! that cannot be opened or queried is reported corrupt; the check never
//! writes to the store.

use rusqlite::{Connection, OpenFlags};
use std::fmt;
use std::path::Path;

/// Result of an integrity check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    Healthy,
    /// First reported defect, or the open/query error
    Corrupt(String),
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Health::Healthy)
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Health::Healthy => f.write_str("ok"),
            Health::Corrupt(detail) => write!(f, "corrupt: {detail}"),
        }
    }
}

/// Checks a single store file
pub trait IntegrityCheck: Send + Sync + 'static {
    fn check(&self, path: &Path) -> Health;
}

/// `PRAGMA integrity_check(1)` on a read-only connection
#[derive(Clone, Copy, Debug, Default)]
pub struct SqliteIntegrityChecker;

impl SqliteIntegrityChecker {
    pub fn new() -> Self {
        Self
    }
}

impl IntegrityCheck for SqliteIntegrityChecker {
    fn check(&self, path: &Path) -> Health {
        let result = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .and_then(|conn| {
            conn.query_row("PRAGMA integrity_check(1)", [], |row| {
                row.get::<_, String>(0)
            })
        });

        match result {
            Ok(report) if report == "ok" => Health::Healthy,
            Ok(report) => Health::Corrupt(report),
            Err(e) => Health::Corrupt(e.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "integrity_tests.rs"]
mod tests;

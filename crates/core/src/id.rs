// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run identifiers
//!
//! Every reconciliation pass and backup tick carries a short id in its
//! tracing span so interleaved log lines from the two loops can be told apart.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generates identifiers for loop runs
pub trait IdGen: Clone + Send + Sync + 'static {
    fn next(&self) -> String;
}

/// Random ids: the first eight hex digits of a v4 UUID
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> String {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(8);
        id
    }
}

/// Predictable ids (`prefix-1`, `prefix-2`, ...) for tests
#[derive(Clone, Debug)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("run")
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;

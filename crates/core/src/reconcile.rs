// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Last-write-wins classification of rooms between the local store and the remote
//!
//! Classification is pure and recomputed on every pass from the two current
//! timestamp sets; nothing here is persisted.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Where a single room stands relative to the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    MissingLocally,
    MissingRemotely,
    NewerLocally,
    NewerRemotely,
    InSync,
}

impl Disposition {
    /// Classify from the last-modified timestamps on each side.
    ///
    /// Returns `None` only when the room exists on neither side.
    pub fn classify(local: Option<f64>, remote: Option<f64>) -> Option<Self> {
        match (local, remote) {
            (None, None) => None,
            (None, Some(_)) => Some(Self::MissingLocally),
            (Some(_), None) => Some(Self::MissingRemotely),
            (Some(l), Some(r)) => Some(match l.total_cmp(&r) {
                Ordering::Greater => Self::NewerLocally,
                Ordering::Less => Self::NewerRemotely,
                Ordering::Equal => Self::InSync,
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingLocally => "missing_locally",
            Self::MissingRemotely => "missing_remotely",
            Self::NewerLocally => "newer_locally",
            Self::NewerRemotely => "newer_remotely",
            Self::InSync => "in_sync",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every room name bucketed by disposition, each bucket sorted by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub missing_locally: Vec<String>,
    pub missing_remotely: Vec<String>,
    pub newer_locally: Vec<String>,
    pub newer_remotely: Vec<String>,
    pub in_sync: Vec<String>,
}

impl ReconcilePlan {
    /// Build a plan from `(name, last_modified)` pairs on each side
    pub fn build<'a, L, R>(local: L, remote: R) -> Self
    where
        L: IntoIterator<Item = (&'a str, f64)>,
        R: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut sides: BTreeMap<&str, (Option<f64>, Option<f64>)> = BTreeMap::new();
        for (name, ts) in local {
            sides.entry(name).or_default().0 = Some(ts);
        }
        for (name, ts) in remote {
            sides.entry(name).or_default().1 = Some(ts);
        }

        let mut plan = Self::default();
        for (name, (l, r)) in sides {
            if let Some(disposition) = Disposition::classify(l, r) {
                plan.bucket_mut(disposition).push(name.to_string());
            }
        }
        plan
    }

    fn bucket_mut(&mut self, disposition: Disposition) -> &mut Vec<String> {
        match disposition {
            Disposition::MissingLocally => &mut self.missing_locally,
            Disposition::MissingRemotely => &mut self.missing_remotely,
            Disposition::NewerLocally => &mut self.newer_locally,
            Disposition::NewerRemotely => &mut self.newer_remotely,
            Disposition::InSync => &mut self.in_sync,
        }
    }

    /// Rooms that need an action, in the order they are applied
    pub fn actions(&self) -> impl Iterator<Item = (Disposition, &str)> + '_ {
        [
            (Disposition::MissingRemotely, &self.missing_remotely),
            (Disposition::MissingLocally, &self.missing_locally),
            (Disposition::NewerLocally, &self.newer_locally),
            (Disposition::NewerRemotely, &self.newer_remotely),
        ]
        .into_iter()
        .flat_map(|(d, names)| names.iter().map(move |n| (d, n.as_str())))
    }

    pub fn actionable(&self) -> usize {
        self.missing_locally.len()
            + self.missing_remotely.len()
            + self.newer_locally.len()
            + self.newer_remotely.len()
    }

    pub fn total(&self) -> usize {
        self.actionable() + self.in_sync.len()
    }
}

/// Terminal outcome for one room within a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Skipped,
    Failed,
}

/// Aggregate counts for one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub pushed: usize,
    pub pulled: usize,
    pub updated_remote: usize,
    pub updated_local: usize,
    pub failed: usize,
    pub skipped: usize,
    pub in_sync: usize,
}

impl ReconcileSummary {
    pub fn record(&mut self, disposition: Disposition, outcome: Outcome) {
        match (outcome, disposition) {
            (Outcome::Failed, _) => self.failed += 1,
            (Outcome::Skipped, _) => self.skipped += 1,
            (Outcome::Applied, Disposition::MissingRemotely) => self.pushed += 1,
            (Outcome::Applied, Disposition::MissingLocally) => self.pulled += 1,
            (Outcome::Applied, Disposition::NewerLocally) => self.updated_remote += 1,
            (Outcome::Applied, Disposition::NewerRemotely) => self.updated_local += 1,
            (Outcome::Applied, Disposition::InSync) => self.in_sync += 1,
        }
    }

    /// Number of rooms whose state changed on either side
    pub fn transitions(&self) -> usize {
        self.pushed + self.pulled + self.updated_remote + self.updated_local
    }
}

impl fmt::Display for ReconcileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pushed={} pulled={} updated_remote={} updated_local={} failed={} skipped={} in_sync={}",
            self.pushed,
            self.pulled,
            self.updated_remote,
            self.updated_local,
            self.failed,
            self.skipped,
            self.in_sync
        )
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;

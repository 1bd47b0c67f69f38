// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backup commands: snapshot, replica, snapshots, prune, tick

use crate::context::Context;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use frd_engine::{PassReport, TickReport};
use frd_storage::{LAST_REPLICA_TIME, LAST_SNAPSHOT_TIME};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Args)]
pub struct PruneArgs {
    /// Delete snapshots at least this old (e.g. "3days"); defaults to
    /// backup.snapshot_max_age
    #[arg(long, value_parser = humantime::parse_duration)]
    max_age: Option<Duration>,
}

#[derive(Serialize)]
struct SnapshotRow {
    store: String,
    index: usize,
    created_at: DateTime<Utc>,
    path: PathBuf,
}

impl fmt::Display for SnapshotRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<18} #{:<3} {}  {}",
            self.store,
            self.index,
            self.created_at.format("%Y-%m-%d %H:%M:%S"),
            self.path.display()
        )
    }
}

enum CopyKind {
    Snapshot,
    Replica,
}

impl CopyKind {
    fn run_key(&self) -> &'static str {
        match self {
            CopyKind::Snapshot => LAST_SNAPSHOT_TIME,
            CopyKind::Replica => LAST_REPLICA_TIME,
        }
    }
}

pub fn snapshot(ctx: &Context, store: Option<&str>) -> Result<ExitCode> {
    copy(ctx, store, CopyKind::Snapshot)
}

pub fn replica(ctx: &Context, store: Option<&str>) -> Result<ExitCode> {
    copy(ctx, store, CopyKind::Replica)
}

/// A corrupt store is never copied: it would overwrite the good backups.
/// The run-state timestamp only moves when every store was attempted.
fn copy(ctx: &Context, store: Option<&str>, kind: CopyKind) -> Result<ExitCode> {
    let ids = ctx.store_ids(store)?;
    let recovery = ctx.recovery();
    let backups = recovery.backups();
    let now = Utc::now();
    let mut failed = false;

    for id in &ids {
        let health = recovery.check(id)?;
        if !health.is_healthy() {
            eprintln!("{}: skipped, {}", id, health);
            failed = true;
            continue;
        }
        let result = match kind {
            CopyKind::Snapshot => backups.create_snapshot(id, now).map(|s| s.path),
            CopyKind::Replica => backups.create_replica(id),
        };
        match result {
            Ok(path) => println!("{}: {}", id, path.display()),
            Err(e) => {
                eprintln!("{}: failed, {}", id, e);
                failed = true;
            }
        }
    }

    if store.is_none() {
        ctx.run_state()?.record_run(kind.run_key(), now)?;
    }
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

pub fn list(ctx: &Context, store: Option<&str>, format: OutputFormat) -> Result<ExitCode> {
    let backups = ctx.backups();
    let mut rows = Vec::new();
    for id in ctx.store_ids(store)? {
        for (index, snapshot) in backups.list_snapshots(&id)?.into_iter().enumerate() {
            rows.push(SnapshotRow {
                store: id.clone(),
                index,
                created_at: snapshot.created_at,
                path: snapshot.path,
            });
        }
    }
    output::print_list(&rows, format, "no snapshots")?;
    Ok(ExitCode::SUCCESS)
}

pub fn prune(ctx: &Context, args: PruneArgs) -> Result<ExitCode> {
    let max_age = args.max_age.unwrap_or(ctx.config.backup.snapshot_max_age);
    let report = ctx.backups().prune_all(max_age, Utc::now());
    println!(
        "removed {} snapshot(s), kept {}, {} failure(s)",
        report.removed, report.kept, report.failed
    );
    Ok(if report.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

pub fn tick(ctx: &Context, format: OutputFormat) -> Result<ExitCode> {
    let report = ctx.scheduler()?.tick();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_tick(&report),
    }
    Ok(if report.unrecovered.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_tick(report: &TickReport) {
    println!("tick {}: checked {} store(s)", report.tick_id, report.checked);
    if !report.recovered.is_empty() {
        println!("  recovered: {}", report.recovered.join(", "));
    }
    if !report.unrecovered.is_empty() {
        println!("  still corrupt: {}", report.unrecovered.join(", "));
    }
    print_round("snapshots", report.snapshots.as_ref());
    print_round("replicas", report.replicas.as_ref());
    println!(
        "  pruned: {} removed, {} kept",
        report.pruned.removed, report.pruned.kept
    );
}

fn print_round(label: &str, round: Option<&PassReport>) {
    let Some(round) = round else {
        println!("  {label}: not due");
        return;
    };
    println!(
        "  {label}: {} created, {} failed, {} excluded",
        round.created.len(),
        round.failed.len(),
        round.excluded.len()
    );
}

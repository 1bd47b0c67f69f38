// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store commands: init, check, recover, restore, migrate

use crate::context::Context;
use crate::error::FrdError;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::{ArgGroup, Args};
use frd_storage::{migrate_store, Health, RecoveryOutcome, RestoreSource, StorageError};
use serde::Serialize;
use std::fmt;
use std::process::ExitCode;

#[derive(Args)]
pub struct RecoverArgs {
    /// Store to recover
    store: String,
    /// Run the chain even if the store passes its check
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
#[command(group(ArgGroup::new("source").required(true).args(["replica", "snapshot"])))]
pub struct RestoreArgs {
    /// Store to restore
    store: String,
    /// Restore from the replica
    #[arg(long)]
    replica: bool,
    /// Restore from snapshot N (0 = newest, as listed by `frd snapshots`)
    #[arg(long, value_name = "N")]
    snapshot: Option<usize>,
}

#[derive(Serialize)]
struct CheckRow {
    store: String,
    healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl CheckRow {
    fn new(store: &str, health: &Health) -> Self {
        let detail = match health {
            Health::Healthy => None,
            Health::Corrupt(detail) => Some(detail.clone()),
        };
        Self {
            store: store.to_string(),
            healthy: health.is_healthy(),
            detail,
        }
    }
}

impl fmt::Display for CheckRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            None => write!(f, "{}: ok", self.store),
            Some(detail) => write!(f, "{}: corrupt ({})", self.store, detail),
        }
    }
}

pub fn init(ctx: &Context) -> Result<ExitCode> {
    ctx.registry.init_all()?;
    ctx.backups().ensure_dirs()?;
    for id in ctx.registry.ids() {
        println!("initialised {}", ctx.store_path(id)?.display());
    }
    Ok(ExitCode::SUCCESS)
}

pub fn check(ctx: &Context, store: Option<&str>, format: OutputFormat) -> Result<ExitCode> {
    let recovery = ctx.recovery();
    let mut rows = Vec::new();
    for id in ctx.store_ids(store)? {
        let health = recovery.check(&id)?;
        rows.push(CheckRow::new(&id, &health));
    }
    output::print_list(&rows, format, "no stores registered")?;

    if rows.iter().all(|row| row.healthy) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

pub fn recover(ctx: &Context, args: RecoverArgs) -> Result<ExitCode> {
    ctx.store_ids(Some(&args.store))?;
    let recovery = ctx.recovery();
    let outcome = if args.force {
        recovery.recover(&args.store)?
    } else {
        recovery.check_and_recover(&args.store)?
    };

    match outcome {
        RecoveryOutcome::Healthy => println!("{}: ok, nothing to recover", args.store),
        RecoveryOutcome::Restored { source, attempts } => println!(
            "{}: restored from {} after {} attempt(s)",
            args.store,
            describe(&source),
            attempts
        ),
        RecoveryOutcome::Unrecovered {
            attempts,
            last_error,
        } => {
            eprintln!(
                "{}: still corrupt after {} attempt(s){}",
                args.store,
                attempts,
                last_error.map(|e| format!(": {e}")).unwrap_or_default()
            );
            return Ok(ExitCode::FAILURE);
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn restore(ctx: &Context, args: RestoreArgs) -> Result<ExitCode> {
    ctx.store_ids(Some(&args.store))?;
    let backups = ctx.backups();

    let source = match args.snapshot {
        Some(index) => match backups.restore_from_snapshot(&args.store, index) {
            Ok(snapshot) => format!(
                "snapshot #{} ({})",
                index,
                snapshot.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            Err(StorageError::NoSnapshot { .. }) => {
                let available = backups.list_snapshots(&args.store)?.len();
                return Err(FrdError::snapshot_out_of_range(&args.store, index, available).into());
            }
            Err(e) => return Err(e.into()),
        },
        None => {
            backups.restore_from_replica(&args.store)?;
            "replica".to_string()
        }
    };

    let health = ctx.recovery().check(&args.store)?;
    println!("{}: restored from {}, now {}", args.store, source, health);
    if health.is_healthy() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

pub fn migrate(ctx: &Context, store: &str) -> Result<ExitCode> {
    ctx.store_ids(Some(store))?;
    let report = migrate_store(&ctx.registry, store)?;
    for (table, rows) in &report.copied {
        println!("{}: copied {} row(s)", table, rows);
    }
    for table in &report.dropped {
        println!("{}: dropped (not in schema)", table);
    }
    println!("{} migrated", store);
    Ok(ExitCode::SUCCESS)
}

fn describe(source: &RestoreSource) -> String {
    match source {
        RestoreSource::Replica => "replica".to_string(),
        RestoreSource::Snapshot { index, path } => {
            format!("snapshot #{} ({})", index, path.display())
        }
    }
}

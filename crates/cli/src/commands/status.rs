// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::context::Context;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use frd_storage::{LAST_REPLICA_TIME, LAST_SNAPSHOT_TIME, LAST_SYNC_TIME};
use serde::Serialize;
use std::fmt;
use std::process::ExitCode;

#[derive(Serialize)]
struct StoreStatus {
    store: String,
    exists: bool,
    snapshots: usize,
    replica: bool,
}

#[derive(Serialize)]
struct Status {
    daemon_pid: Option<u32>,
    last_snapshot: Option<DateTime<Utc>>,
    last_replica: Option<DateTime<Utc>>,
    last_sync: Option<DateTime<Utc>>,
    stores: Vec<StoreStatus>,
}

fn stamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "never".to_string())
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.daemon_pid {
            Some(pid) => writeln!(f, "daemon:        running (pid {pid})")?,
            None => writeln!(f, "daemon:        not running")?,
        }
        writeln!(f, "last snapshot: {}", stamp(self.last_snapshot))?;
        writeln!(f, "last replica:  {}", stamp(self.last_replica))?;
        write!(f, "last sync:     {}", stamp(self.last_sync))?;
        for store in &self.stores {
            write!(f, "\n  {:<18}", store.store)?;
            if !store.exists {
                write!(f, " missing")?;
                continue;
            }
            write!(
                f,
                " {} snapshot(s), replica {}",
                store.snapshots,
                if store.replica { "present" } else { "absent" }
            )?;
        }
        Ok(())
    }
}

pub fn status(ctx: &Context, format: OutputFormat) -> Result<ExitCode> {
    let run_state = ctx.run_state()?;
    let backups = ctx.backups();

    let mut stores = Vec::new();
    for id in ctx.registry.ids() {
        stores.push(StoreStatus {
            store: id.to_string(),
            exists: ctx.store_path(id)?.is_file(),
            snapshots: backups.list_snapshots(id)?.len(),
            replica: backups.has_replica(id),
        });
    }

    let status = Status {
        daemon_pid: ctx.daemon_pid(),
        last_snapshot: run_state.last_run(LAST_SNAPSHOT_TIME),
        last_replica: run_state.last_run(LAST_REPLICA_TIME),
        last_sync: run_state.last_run(LAST_SYNC_TIME),
        stores,
    };
    output::print(&status, format)?;
    Ok(ExitCode::SUCCESS)
}

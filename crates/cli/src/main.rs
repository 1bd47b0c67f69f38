// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! frd - store keeper CLI
//!
//! Operator access to the store files, their backups, and the remote
//! archive. Commands run in-process; they do not talk to a running daemon.

mod commands;
mod context;
mod error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{backup, status, stores, sync};
use context::Context;
use output::OutputFormat;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "frd", version, about = "Store keeper - backups, recovery and remote sync")]
struct Cli {
    /// Config file (defaults to ./frd.toml when present)
    #[arg(long, global = true, env = "FRD_CONFIG")]
    config: Option<PathBuf>,

    /// Emit JSON (check, snapshots, sync, status, tick)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create store files and their tables
    Init,
    /// Run integrity checks; exits 1 if any store is corrupt
    Check {
        /// Store to check (all when omitted)
        store: Option<String>,
    },
    /// Take a snapshot now
    Snapshot {
        /// Store to snapshot (all when omitted)
        store: Option<String>,
    },
    /// Refresh the replica now
    Replica {
        /// Store to replicate (all when omitted)
        store: Option<String>,
    },
    /// List snapshots newest-first
    Snapshots {
        /// Store to list (all when omitted)
        store: Option<String>,
    },
    /// Delete expired snapshots
    Prune(backup::PruneArgs),
    /// Run the recovery chain for a store
    Recover(stores::RecoverArgs),
    /// Restore a store from its replica or a snapshot
    Restore(stores::RestoreArgs),
    /// Run one backup scheduler tick
    Tick,
    /// Run one reconciliation pass against the remote
    Sync,
    /// Replace the local room store with the remote export
    Mirror(sync::MirrorArgs),
    /// Rebuild a store under its current schema
    Migrate {
        /// Store to migrate
        store: String,
    },
    /// Show run-state timestamps and backup counts
    Status,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();
    let format = OutputFormat::from_flag(cli.json);

    let result = run(cli, format).await;
    if let Err(e) = &result {
        if let Some(frd) = e.downcast_ref::<error::FrdError>() {
            eprint!("{}", frd);
            return Ok(ExitCode::FAILURE);
        }
    }
    result
}

async fn run(cli: Cli, format: OutputFormat) -> Result<ExitCode> {
    let ctx = Context::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => stores::init(&ctx),
        Commands::Check { store } => stores::check(&ctx, store.as_deref(), format),
        Commands::Snapshot { store } => backup::snapshot(&ctx, store.as_deref()),
        Commands::Replica { store } => backup::replica(&ctx, store.as_deref()),
        Commands::Snapshots { store } => backup::list(&ctx, store.as_deref(), format),
        Commands::Prune(args) => backup::prune(&ctx, args),
        Commands::Recover(args) => stores::recover(&ctx, args),
        Commands::Restore(args) => stores::restore(&ctx, args),
        Commands::Tick => backup::tick(&ctx, format),
        Commands::Sync => sync::sync(&ctx, format).await,
        Commands::Mirror(args) => sync::mirror(&ctx, args).await,
        Commands::Migrate { store } => stores::migrate(&ctx, &store),
        Commands::Status => status::status(&ctx, format),
    }
}

/// Warnings and errors to stderr; `RUST_LOG` overrides
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).without_time())
        .init();
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store keeper daemon (frdd)
//!
//! Background process that runs the backup scheduler and the remote
//! reconciliation loop until signalled.

use std::path::PathBuf;

use frd_core::Config;
use frd_daemon::{
    lifecycle, log_event, LifecycleError, CONFIG_ENV, DEFAULT_CONFIG_FILE, STARTUP_MARKER_PREFIX,
};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config path: first argument, then FRD_CONFIG, then ./frd.toml
    let args: Vec<String> = std::env::args().collect();
    let config_path = match args.get(1).cloned().or_else(|| std::env::var(CONFIG_ENV).ok()) {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir()?.join(DEFAULT_CONFIG_FILE),
    };

    // Load configuration
    let base = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    let config = Config::load_or_default(&config_path, &base)?;

    // Write startup marker to log (before tracing setup)
    write_startup_marker(&config)?;

    // Set up logging
    let log_guard = setup_logging(&config)?;

    info!("Starting frdd with config {}", config_path.display());

    // Start daemon
    let mut daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    // Set up signal handlers
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(loops = ?daemon.loops(), "Daemon ready");

    // Signal ready for parent process
    println!("READY");

    loop {
        tokio::select! {
            Some(event) = daemon.events.recv() => log_event(&event),

            // Graceful shutdown on SIGTERM
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }

            // Graceful shutdown on SIGINT
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
        }
    }

    daemon.shutdown().await?;

    // Log whatever the loops reported while stopping
    while let Ok(event) = daemon.events.try_recv() {
        log_event(&event);
    }

    info!("Daemon stopped");
    Ok(())
}

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    let log_path = config.paths.log_path();
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.paths.log_path())
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    std::fs::create_dir_all(&config.paths.state_dir)?;

    // Set up file appender
    let file_appender = tracing_appender::rolling::never(&config.paths.state_dir, "daemon.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Set up subscriber with env filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

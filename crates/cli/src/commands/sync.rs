// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote commands: sync, mirror

use crate::context::Context;
use crate::error::FrdError;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::Args;
use std::process::ExitCode;

#[derive(Args)]
pub struct MirrorArgs {
    /// Confirm that local rooms and their history may be overwritten
    #[arg(long)]
    yes: bool,
}

pub async fn sync(ctx: &Context, format: OutputFormat) -> Result<ExitCode> {
    let reconciler = ctx.reconciler()?;
    let summary = reconciler.reconcile().await?;
    output::print(&summary, format)?;
    Ok(if summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

pub async fn mirror(ctx: &Context, args: MirrorArgs) -> Result<ExitCode> {
    if !args.yes {
        return Err(FrdError::mirror_needs_confirmation().into());
    }
    let report = ctx.reconciler()?.mirror().await?;
    println!(
        "mirrored: {} created, {} updated, {} deleted, {} failed",
        report.created, report.updated, report.deleted, report.failed
    );
    Ok(if report.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

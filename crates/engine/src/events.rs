// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events the loops report to their host

use crate::backup::TickReport;
use frd_core::ReconcileSummary;

/// Something a loop wants the host to know about
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A backup tick finished
    TickCompleted(TickReport),
    /// A store is still corrupt after its recovery chain was exhausted
    StoreUnrecovered { store: String },
    /// A reconciliation pass finished
    SyncCompleted(ReconcileSummary),
    /// A reconciliation pass aborted before applying anything
    SyncAborted { reason: String },
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::TickCompleted(_) => "backup:tick",
            EngineEvent::StoreUnrecovered { .. } => "backup:unrecovered",
            EngineEvent::SyncCompleted(_) => "sync:completed",
            EngineEvent::SyncAborted { .. } => "sync:aborted",
        }
    }
}

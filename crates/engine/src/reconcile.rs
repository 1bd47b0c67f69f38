// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation between the local room store and the remote archive
//!
//! A pass fetches the full remote export first; any failure there aborts the
//! pass before the local store is read. Each room then gets exactly one
//! action, and per-room failures are counted without stopping the batch.

use crate::error::EngineError;
use crate::events::EngineEvent;
use frd_adapters::{RemoteAdapter, RemoteRoom, RoomUpload};
use frd_core::{
    AssetPolicy, AssetVerdict, Clock, Disposition, IdGen, Outcome, ReconcilePlan,
    ReconcileSummary, RoomDoc,
};
use frd_storage::{HistoryPolicy, RoomStore, RunState, StorageError, LAST_SYNC_TIME};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Counts from an explicit mirror
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MirrorReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Runs reconciliation passes against one remote
pub struct Reconciler<R, C, I> {
    remote: R,
    rooms: RoomStore,
    run_state: Arc<RunState>,
    policy: AssetPolicy,
    clock: C,
    ids: I,
}

impl<R, C, I> Reconciler<R, C, I>
where
    R: RemoteAdapter,
    C: Clock,
    I: IdGen,
{
    pub fn new(remote: R, rooms: RoomStore, run_state: Arc<RunState>, clock: C, ids: I) -> Self {
        Self {
            remote,
            rooms,
            run_state,
            policy: AssetPolicy::default(),
            clock,
            ids,
        }
    }

    pub fn with_policy(mut self, policy: AssetPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// One full pass. Errors only when the pass aborted before applying
    /// anything; per-room failures are in the summary.
    pub async fn reconcile(&self) -> Result<ReconcileSummary, EngineError> {
        let run = self.ids.next();
        async {
            let export = self.remote.export().await?;
            let local = self.with_rooms(|rooms| rooms.all()).await?;

            let plan = ReconcilePlan::build(
                local.iter().map(|(name, doc)| (name.as_str(), doc.last_updated)),
                export
                    .rooms
                    .iter()
                    .map(|(name, room)| (name.as_str(), room.last_edited)),
            );
            info!(
                local = local.len(),
                remote = export.rooms.len(),
                actionable = plan.actionable(),
                "reconciliation planned"
            );

            let mut summary = ReconcileSummary::default();
            for _ in &plan.in_sync {
                summary.record(Disposition::InSync, Outcome::Applied);
            }
            for (disposition, name) in plan.actions() {
                let doc = local.get(name);
                let remote = export.rooms.get(name);
                let outcome = match (disposition, doc, remote) {
                    (Disposition::MissingRemotely, Some(doc), _) => {
                        self.push(disposition, doc, None).await
                    }
                    (Disposition::NewerLocally, Some(doc), Some(remote)) => {
                        self.push(disposition, doc, Some(remote)).await
                    }
                    (Disposition::MissingLocally, _, Some(remote)) => {
                        self.pull(name, remote, HistoryPolicy::Preserve).await
                    }
                    (Disposition::NewerRemotely, _, Some(remote)) => {
                        self.pull(name, remote, inbound_history(remote)).await
                    }
                    _ => {
                        error!(room = name, %disposition, "room vanished from plan inputs");
                        Outcome::Failed
                    }
                };
                debug!(room = name, %disposition, ?outcome, "room reconciled");
                summary.record(disposition, outcome);
            }

            if let Err(e) = self.run_state.set(LAST_SYNC_TIME, self.clock.unix_now()) {
                warn!(error = %e, "failed to record sync time");
            }
            info!(%summary, "reconciliation finished");
            Ok::<_, EngineError>(summary)
        }
        .instrument(info_span!("reconcile", run_id = %run))
        .await
    }

    async fn push(
        &self,
        disposition: Disposition,
        doc: &RoomDoc,
        remote: Option<&RemoteRoom>,
    ) -> Outcome {
        let images = match self.policy.evaluate(&doc.picture_urls) {
            AssetVerdict::Accept { upload, rejected } => {
                if rejected > 0 {
                    debug!(room = %doc.name, rejected, "dropping invalid image references");
                }
                upload
            }
            AssetVerdict::Insufficient { valid, required } => {
                info!(room = %doc.name, valid, required, "push skipped: too few images");
                return self.after_skip(&doc.name, remote).await;
            }
        };

        match self.remote.upsert(&RoomUpload::from_doc(doc, images)).await {
            Ok(()) => Outcome::Applied,
            Err(e) if e.is_skip() => {
                info!(room = %doc.name, error = %e, "push refused by remote");
                self.after_skip(&doc.name, remote).await
            }
            Err(e) => {
                warn!(room = %doc.name, %disposition, error = %e, "push failed");
                Outcome::Failed
            }
        }
    }

    /// A skipped update must not leave the sides diverged: the local room
    /// falls back to the remote version. New rooms just stay local.
    async fn after_skip(&self, name: &str, remote: Option<&RemoteRoom>) -> Outcome {
        let Some(remote) = remote else {
            return Outcome::Skipped;
        };
        match self.pull(name, remote, inbound_history(remote)).await {
            Outcome::Applied => Outcome::Skipped,
            _ => Outcome::Failed,
        }
    }

    async fn pull(&self, name: &str, remote: &RemoteRoom, history: HistoryPolicy) -> Outcome {
        let doc = remote.to_room_doc(name);
        match self
            .with_rooms(move |rooms| rooms.replace(&doc, history))
            .await
        {
            Ok(_) => Outcome::Applied,
            Err(e) => {
                warn!(room = name, error = %e, "pull failed");
                Outcome::Failed
            }
        }
    }

    /// Make the local store an exact copy of the remote export, histories
    /// included. Local rooms the remote does not have are deleted.
    pub async fn mirror(&self) -> Result<MirrorReport, EngineError> {
        let run = self.ids.next();
        async {
            let export = self.remote.export().await?;
            let existing: BTreeSet<String> = self
                .with_rooms(|rooms| rooms.names())
                .await?
                .into_iter()
                .collect();

            let mut report = MirrorReport::default();
            for (name, remote) in &export.rooms {
                let doc = remote.to_room_doc(name);
                let history = HistoryPolicy::Replace(remote.edits.clone().unwrap_or_default());
                match self
                    .with_rooms(move |rooms| rooms.replace(&doc, history))
                    .await
                {
                    Ok(_) if existing.contains(name) => report.updated += 1,
                    Ok(_) => report.created += 1,
                    Err(e) => {
                        warn!(room = %name, error = %e, "mirror write failed");
                        report.failed += 1;
                    }
                }
            }

            for name in existing
                .iter()
                .filter(|name| !export.rooms.contains_key(name.as_str()))
            {
                let target = name.clone();
                match self.with_rooms(move |rooms| rooms.delete(&target)).await {
                    Ok(_) => report.deleted += 1,
                    Err(e) => {
                        warn!(room = %name, error = %e, "mirror delete failed");
                        report.failed += 1;
                    }
                }
            }

            info!(?report, "mirror finished");
            Ok::<_, EngineError>(report)
        }
        .instrument(info_span!("mirror", run_id = %run))
        .await
    }

    /// Run a pass now and then every `interval` until shutdown.
    ///
    /// Shutdown drops an in-flight pass between room steps; a store write
    /// already handed to the blocking pool still completes.
    pub async fn run(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
        events: mpsc::Sender<EngineEvent>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }

            let result = tokio::select! {
                result = self.reconcile() => result,
                _ = shutdown.changed() => break,
            };
            let event = match result {
                Ok(summary) => EngineEvent::SyncCompleted(summary),
                Err(e) => {
                    warn!(error = %e, "reconciliation aborted");
                    EngineEvent::SyncAborted {
                        reason: e.to_string(),
                    }
                }
            };
            if events.send(event).await.is_err() {
                return;
            }
        }
        info!("reconciliation loop stopped");
    }

    async fn with_rooms<T, F>(&self, f: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: FnOnce(&RoomStore) -> Result<T, StorageError> + Send + 'static,
    {
        let rooms = self.rooms.clone();
        tokio::task::spawn_blocking(move || f(&rooms))
            .await
            .map_err(|e| EngineError::Task(e.to_string()))?
            .map_err(EngineError::from)
    }
}

/// Inbound updates keep local history and add whatever the remote supplies
fn inbound_history(remote: &RemoteRoom) -> HistoryPolicy {
    HistoryPolicy::Merge(remote.edits.clone().unwrap_or_default())
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;

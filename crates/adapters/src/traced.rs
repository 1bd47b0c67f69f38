// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::remote::{RemoteAdapter, RemoteError, RemoteExport, RoomUpload};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any RemoteAdapter
#[derive(Clone)]
pub struct TracedRemoteAdapter<R> {
    inner: R,
}

impl<R> TracedRemoteAdapter<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: RemoteAdapter> RemoteAdapter for TracedRemoteAdapter<R> {
    async fn export(&self) -> Result<RemoteExport, RemoteError> {
        let span = tracing::info_span!("remote.export");
        async {
            let start = std::time::Instant::now();
            let result = self.inner.export().await;
            let elapsed = start.elapsed();

            match &result {
                Ok(export) => tracing::info!(
                    rooms = export.rooms.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "export fetched"
                ),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "export failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn upsert(&self, room: &RoomUpload) -> Result<(), RemoteError> {
        let span = tracing::info_span!("remote.upsert", room = %room.room_name);
        async {
            tracing::debug!(images = room.images.len(), "uploading");

            let start = std::time::Instant::now();
            let result = self.inner.upsert(room).await;
            let elapsed = start.elapsed();

            // Asset refusals are routine; anything else is a real failure
            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "uploaded"),
                Err(e) if e.is_skip() => tracing::warn!(error = %e, "upload skipped"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "upload failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;

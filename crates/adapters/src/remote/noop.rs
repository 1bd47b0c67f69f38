// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote adapter used when no archive is configured.

use super::{RemoteAdapter, RemoteError, RemoteExport, RoomUpload};
use async_trait::async_trait;

/// Remote adapter that refuses every call with `NotConfigured`.
///
/// Reconciliation against it aborts before touching the local store.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpRemoteAdapter;

impl NoOpRemoteAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RemoteAdapter for NoOpRemoteAdapter {
    async fn export(&self) -> Result<RemoteExport, RemoteError> {
        Err(RemoteError::NotConfigured)
    }

    async fn upsert(&self, _room: &RoomUpload) -> Result<(), RemoteError> {
        Err(RemoteError::NotConfigured)
    }
}

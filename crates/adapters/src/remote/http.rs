// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP adapter for the remote archive
//!
//! - `GET  {base}/database/export` returns `{success, rooms, exported_at?}`
//! - `POST {base}/upload-room` accepts a [`RoomUpload`]; 200 and 201 are success
//!
//! ureq is blocking, so each call runs on the blocking pool.

use super::{RemoteAdapter, RemoteError, RemoteExport, RemoteRoom, RoomUpload};
use async_trait::async_trait;
use frd_core::{RemoteConfig, RemoteCredentials};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use ureq::Agent;

/// Largest export body accepted
const EXPORT_LIMIT: u64 = 256 * 1024 * 1024;
/// Error bodies are truncated to this many characters
const ERROR_SNIPPET: usize = 200;

#[derive(Deserialize)]
struct ExportEnvelope {
    #[serde(default)]
    success: bool,
    rooms: Option<BTreeMap<String, RemoteRoom>>,
    error: Option<String>,
    exported_at: Option<String>,
}

#[derive(Deserialize, Default)]
struct UpsertEnvelope {
    success: Option<bool>,
    error: Option<String>,
    #[serde(default)]
    skipped: bool,
}

/// Remote adapter speaking to the archive over HTTP
#[derive(Clone)]
pub struct HttpRemoteAdapter {
    base_url: String,
    api_key: String,
    agent: Agent,
    export_agent: Agent,
    min_assets: usize,
}

impl std::fmt::Debug for HttpRemoteAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemoteAdapter")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

fn snippet(body: &str) -> String {
    body.chars().take(ERROR_SNIPPET).collect()
}

impl HttpRemoteAdapter {
    pub fn new(
        credentials: RemoteCredentials,
        timeout: Duration,
        export_timeout: Duration,
        min_assets: usize,
    ) -> Self {
        Self {
            base_url: credentials.base_url,
            api_key: credentials.api_key,
            agent: agent(timeout),
            export_agent: agent(export_timeout),
            min_assets,
        }
    }

    /// Build from config; `NotConfigured` when the URL or key is missing
    pub fn from_config(config: &RemoteConfig, min_assets: usize) -> Result<Self, RemoteError> {
        let credentials = config.credentials().ok_or(RemoteError::NotConfigured)?;
        Ok(Self::new(
            credentials,
            config.timeout,
            config.export_timeout,
            min_assets,
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    fn export_blocking(&self) -> Result<RemoteExport, RemoteError> {
        let url = format!("{}/database/export", self.base_url);
        let mut response = self
            .export_agent
            .get(&url)
            .header("Authorization", &self.bearer())
            .call()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let code = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(EXPORT_LIMIT)
            .read_to_string()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        if code != 200 {
            return Err(RemoteError::Status {
                code,
                body: snippet(&body),
            });
        }

        let envelope: ExportEnvelope =
            serde_json::from_str(&body).map_err(|e| RemoteError::Malformed(e.to_string()))?;
        if !envelope.success {
            return Err(RemoteError::Rejected(
                envelope.error.unwrap_or_else(|| "export unsuccessful".into()),
            ));
        }
        let rooms = envelope
            .rooms
            .ok_or_else(|| RemoteError::Malformed("export has no rooms".into()))?;
        Ok(RemoteExport {
            rooms,
            exported_at: envelope.exported_at,
        })
    }

    fn upsert_blocking(&self, room: &RoomUpload) -> Result<(), RemoteError> {
        if room.images.len() < self.min_assets {
            return Err(RemoteError::InsufficientAssets {
                valid: room.images.len(),
                required: self.min_assets,
            });
        }

        let url = format!("{}/upload-room", self.base_url);
        let payload =
            serde_json::to_vec(room).map_err(|e| RemoteError::Malformed(e.to_string()))?;
        let mut response = self
            .agent
            .post(&url)
            .header("Authorization", &self.bearer())
            .header("Content-Type", "application/json")
            .send(&payload[..])
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let code = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let envelope: UpsertEnvelope = serde_json::from_str(&body).unwrap_or_default();

        if envelope.skipped {
            return Err(RemoteError::InsufficientAssets {
                valid: room.images.len(),
                required: self.min_assets,
            });
        }
        if code != 200 && code != 201 {
            return Err(RemoteError::Status {
                code,
                body: snippet(&body),
            });
        }
        if envelope.success == Some(false) {
            return Err(RemoteError::Rejected(
                envelope.error.unwrap_or_else(|| "upload unsuccessful".into()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteAdapter for HttpRemoteAdapter {
    async fn export(&self) -> Result<RemoteExport, RemoteError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.export_blocking())
            .await
            .map_err(|e| RemoteError::Transport(format!("export task failed: {e}")))?
    }

    async fn upsert(&self, room: &RoomUpload) -> Result<(), RemoteError> {
        let this = self.clone();
        let room = room.clone();
        tokio::task::spawn_blocking(move || this.upsert_blocking(&room))
            .await
            .map_err(|e| RemoteError::Transport(format!("upload task failed: {e}")))?
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;

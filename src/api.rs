//! HTTP client for the catalog server.
//!
//! Four operations, all treated as black boxes returning parsed JSON or a
//! success signal: snapshot fetch, live stream URL, reset, and the optional
//! countdown status. Calls run on worker threads (the poller) or one-shot CLI
//! paths, so the blocking client is the right tool; timeouts are short enough
//! that a dead server never wedges a poll cycle past the next tick.
//!
//! Error policy is the caller's: every [`ApiError`] means "keep previous
//! state", nothing here retries or surfaces anything to the user.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::model::types::Snapshot;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {0}")]
    Status(reqwest::StatusCode),
}

/// Cosmetic countdown feed from `/api/status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    /// Milliseconds until the server's next detection scan persists.
    #[serde(default)]
    pub scan_remaining_ms: u64,
    /// Seconds of demo footage remaining before loop-around.
    #[serde(default)]
    pub video_remaining_sec: u64,
}

/// Blocking client over the server's four endpoints.
pub struct ApiClient {
    base: String,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self::with_timeout(&config.server, config.http_timeout)
    }

    pub fn with_timeout(base: &str, timeout: Duration) -> Self {
        let http = reqwest::blocking::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            base: base.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Server base URL, no trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// `GET /api/data`: one full catalog snapshot. A non-2xx status or a
    /// schema violation rejects the snapshot wholesale.
    pub fn fetch_snapshot(&self) -> Result<Snapshot, ApiError> {
        let url = format!("{}/api/data", self.base);
        let resp = self.http.get(&url).send()?;
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status()));
        }
        let snapshot: Snapshot = resp.json()?;
        debug!(groups = snapshot.len(), "fetched catalog snapshot");
        Ok(snapshot)
    }

    /// The live MJPEG stream resource for the current annotation flag. The
    /// TUI re-requests (re-displays) this whenever Live is entered or the
    /// box toggle flips.
    pub fn stream_url(&self, annotated: bool) -> String {
        format!("{}/api/stream?annotated={annotated}", self.base)
    }

    /// `POST /api/reset`: clear server-side state. Success only on 2xx; the
    /// caller resets local state only after this returns Ok.
    pub fn reset(&self) -> Result<(), ApiError> {
        let url = format!("{}/api/reset", self.base);
        let resp = self.http.post(&url).send()?;
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status()));
        }
        debug!("server reset acknowledged");
        Ok(())
    }

    /// `GET /api/status`: countdown displays only. Optional endpoint; any
    /// failure is expected to be swallowed by the caller.
    pub fn fetch_status(&self) -> Result<ServerStatus, ApiError> {
        let url = format!("{}/api/status", self.base);
        let resp = self.http.get(&url).send()?;
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status()));
        }
        Ok(resp.json()?)
    }
}

//! Runtime configuration.
//!
//! Everything is env-driven with sane defaults; `dotenvy` picks up a local
//! `.env` so development against a non-default server doesn't need exports.

use std::path::PathBuf;
use std::time::Duration;

/// Default catalog server.
const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

/// Catalog poll cadence (matches the server's ~10s detection save interval
/// closely enough to surface new frames within one scan).
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Cosmetic countdown/status refresh cadence.
const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// HTTP timeout. Short: a hung request should never outlive the next poll.
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(4);

/// Client configuration, from environment with defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the catalog server (no trailing slash).
    pub server: String,
    /// How often the poller refetches `/api/data`.
    pub poll_interval: Duration,
    /// How often the poller refetches `/api/status`.
    pub status_interval: Duration,
    /// Connect + request timeout for all HTTP calls.
    pub http_timeout: Duration,
    /// Data dir for TUI log files.
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            status_interval: DEFAULT_STATUS_INTERVAL,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            data_dir: crate::default_data_dir(),
        }
    }
}

impl Config {
    /// Load config from `DWATCH_*` environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(server) = dotenvy::var("DWATCH_SERVER") {
            cfg.server = server.trim_end_matches('/').to_string();
        }

        if let Ok(val) = dotenvy::var("DWATCH_POLL_INTERVAL_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            cfg.poll_interval = Duration::from_millis(ms);
        }

        if let Ok(val) = dotenvy::var("DWATCH_STATUS_INTERVAL_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            cfg.status_interval = Duration::from_millis(ms);
        }

        if let Ok(val) = dotenvy::var("DWATCH_HTTP_TIMEOUT_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            cfg.http_timeout = Duration::from_millis(ms);
        }

        if let Ok(dir) = dotenvy::var("DWATCH_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }

        cfg
    }

    /// Apply a `--server` CLI override on top of env config.
    #[must_use]
    pub fn with_server(mut self, server: Option<String>) -> Self {
        if let Some(server) = server {
            self.server = server.trim_end_matches('/').to_string();
        }
        self
    }
}

//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.inbox-chat/config.json`) and environment.
//! Only the backend endpoint and the request deadline are configurable.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default backend root (the mail-search service started on the same machine).
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";

/// Default deadline for one round trip, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const CHAT_PATH: &str = "/chat";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Remote mail-search service settings.
    #[serde(default)]
    pub backend: BackendConfig,
}

/// Where to send queries and how long to wait for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Service root or full `/chat` endpoint. Overridden by INBOX_CHAT_BACKEND_URL env.
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Deadline for one request in milliseconds (default 10000). Overridden by INBOX_CHAT_TIMEOUT_MS env.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl BackendConfig {
    /// Service root: configured url without trailing slashes or a trailing `/chat`.
    pub fn root_url(&self) -> String {
        let url = self.url.trim().trim_end_matches('/');
        url.strip_suffix(CHAT_PATH)
            .unwrap_or(url)
            .trim_end_matches('/')
            .to_string()
    }

    /// Endpoint that receives `POST {"query": ...}`.
    pub fn chat_url(&self) -> String {
        format!("{}{}", self.root_url(), CHAT_PATH)
    }

    /// Endpoint used by the connectivity probe (`GET`).
    pub fn probe_url(&self) -> String {
        self.root_url()
    }

    /// Request deadline. A zero timeout is not allowed and falls back to the default.
    pub fn timeout(&self) -> Duration {
        if self.timeout_ms == 0 {
            log::warn!(
                "timeoutMs must be greater than 0, using default of {}ms",
                DEFAULT_TIMEOUT_MS
            );
            return Duration::from_millis(DEFAULT_TIMEOUT_MS);
        }
        Duration::from_millis(self.timeout_ms)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Apply INBOX_CHAT_BACKEND_URL and INBOX_CHAT_TIMEOUT_MS over the file values.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(url) = non_empty_env("INBOX_CHAT_BACKEND_URL") {
        config.backend.url = url;
    }
    if let Some(raw) = non_empty_env("INBOX_CHAT_TIMEOUT_MS") {
        match raw.parse::<u64>() {
            Ok(ms) => config.backend.timeout_ms = ms,
            Err(_) => log::warn!("ignoring INBOX_CHAT_TIMEOUT_MS={:?}: not a number", raw),
        }
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("INBOX_CHAT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".inbox-chat").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or INBOX_CHAT_CONFIG_PATH).
/// Missing file => default config. Env overrides are applied on top.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    apply_env_overrides(&mut config);
    Ok((config, path))
}

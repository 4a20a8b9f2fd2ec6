//! Hub session configuration.

use bittrex_core::Feed;
use serde::Deserialize;
use std::time::Duration;

/// Settings shared by every session opened against the hub.
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Hub host name, without scheme.
    #[serde(default = "default_host")]
    pub host: String,
    /// Hub name used for invocations. Pushes are matched case-insensitively.
    #[serde(default = "default_hub")]
    pub hub: String,
    /// Use `https`/`wss`. Disable only for local test servers.
    #[serde(default = "default_true")]
    pub use_tls: bool,
    /// Overrides the per-feed connect timeout when set.
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    /// Bound on each `Authenticate`/`Subscribe` call.
    #[serde(default = "default_invoke_timeout_ms")]
    pub invoke_timeout_ms: u64,
    /// How often the liveness monitor checks the last-seen timestamp.
    #[serde(default = "default_liveness_interval_ms")]
    pub liveness_interval_ms: u64,
    /// Silence longer than this ends the session with a feed timeout.
    #[serde(default = "default_liveness_threshold_ms")]
    pub liveness_threshold_ms: u64,
    /// Subscribe candle feeds to the one-minute topic whatever interval
    /// was requested.
    #[serde(default = "default_true")]
    pub pin_candle_interval: bool,
}

fn default_host() -> String {
    "socket-v3.bittrex.com".to_string()
}

fn default_hub() -> String {
    "c3".to_string()
}

fn default_true() -> bool {
    true
}

fn default_invoke_timeout_ms() -> u64 {
    10_000
}

fn default_liveness_interval_ms() -> u64 {
    60_000
}

fn default_liveness_threshold_ms() -> u64 {
    60_000
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            hub: default_hub(),
            use_tls: true,
            connect_timeout_ms: None,
            invoke_timeout_ms: default_invoke_timeout_ms(),
            liveness_interval_ms: default_liveness_interval_ms(),
            liveness_threshold_ms: default_liveness_threshold_ms(),
            pin_candle_interval: true,
        }
    }
}

impl HubConfig {
    /// Connect timeout for a session carrying `feeds`: the configured
    /// override, otherwise the longest default among the feeds.
    pub fn connect_timeout(&self, feeds: &[Feed]) -> Duration {
        if let Some(ms) = self.connect_timeout_ms {
            return Duration::from_millis(ms);
        }
        feeds
            .iter()
            .map(|feed| feed.kind().default_connect_timeout())
            .max()
            .unwrap_or(Duration::from_secs(5))
    }

    pub fn invoke_timeout(&self) -> Duration {
        Duration::from_millis(self.invoke_timeout_ms)
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_interval_ms)
    }

    pub fn liveness_threshold(&self) -> Duration {
        Duration::from_millis(self.liveness_threshold_ms)
    }

    pub(crate) fn http_base(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{scheme}://{}", self.host)
    }

    pub(crate) fn ws_base(&self) -> String {
        let scheme = if self.use_tls { "wss" } else { "ws" };
        format!("{scheme}://{}", self.host)
    }
}

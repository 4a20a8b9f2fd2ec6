//! Application configuration.

use crate::error::{AppError, AppResult};
use bittrex_core::Feed;
use bittrex_ws::{Credentials, HubConfig};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

/// Environment variable holding the API key for private feeds.
pub const API_KEY_ENV: &str = "BITTREX_API_KEY";
/// Environment variable holding the API secret for private feeds.
pub const API_SECRET_ENV: &str = "BITTREX_API_SECRET";

/// One session: a named group of feeds sharing a hub connection.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub name: String,
    /// Topics such as `"trade_BTC-USD"` or `"orderbook_ETH-USD_25"`.
    pub feeds: Vec<String>,
}

impl SessionConfig {
    pub fn parse_feeds(&self) -> AppResult<Vec<Feed>> {
        self.feeds
            .iter()
            .map(|topic| Feed::from_topic(topic).map_err(AppError::from))
            .collect()
    }

    pub fn is_private(&self) -> bool {
        self.parse_feeds()
            .map(|feeds| feeds.iter().any(Feed::is_private))
            .unwrap_or(false)
    }
}

/// REST collaborator settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RestConfig {
    #[serde(default = "default_rest_base_url")]
    pub base_url: String,
    #[serde(default = "default_rest_timeout_ms")]
    pub timeout_ms: u64,
    /// Check configured markets against the market listing before streaming.
    #[serde(default = "default_true")]
    pub preflight: bool,
}

fn default_rest_base_url() -> String {
    bittrex_rest::DEFAULT_BASE_URL.to_string()
}

fn default_rest_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: default_rest_base_url(),
            timeout_ms: default_rest_timeout_ms(),
            preflight: true,
        }
    }
}

impl RestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub rest: RestConfig,
    /// Capacity of the channel shared by all sessions and the consumer.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// How often the consumer logs its counters.
    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
    #[serde(default)]
    pub sessions: Vec<SessionConfig>,
}

fn default_channel_capacity() -> usize {
    1024
}

fn default_stats_interval_ms() -> u64 {
    60_000
}

impl AppConfig {
    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML content.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.sessions.is_empty() {
            return Err(AppError::Config("no sessions configured".to_string()));
        }
        if self.channel_capacity == 0 {
            return Err(AppError::Config(
                "channel_capacity must be positive".to_string(),
            ));
        }
        if self.hub.liveness_interval_ms == 0 {
            return Err(AppError::Config(
                "hub.liveness_interval_ms must be positive".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for session in &self.sessions {
            if !names.insert(session.name.as_str()) {
                return Err(AppError::Config(format!(
                    "duplicate session name: {}",
                    session.name
                )));
            }
            if session.feeds.is_empty() {
                return Err(AppError::Config(format!(
                    "session {} has no feeds",
                    session.name
                )));
            }
            session.parse_feeds()?;
        }
        Ok(())
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }

    /// Whether any session subscribes to an account stream.
    pub fn needs_credentials(&self) -> bool {
        self.sessions.iter().any(SessionConfig::is_private)
    }
}

/// API credentials from `BITTREX_API_KEY`/`BITTREX_API_SECRET`, if both are set.
pub fn credentials_from_env() -> Option<Credentials> {
    let key = std::env::var(API_KEY_ENV).ok()?;
    let secret = std::env::var(API_SECRET_ENV).ok()?;
    if key.is_empty() || secret.is_empty() {
        return None;
    }
    Some(Credentials::new(key, secret))
}

//! Main application orchestration.
//!
//! Coordinates all components:
//! - REST preflight against the market listing
//! - One hub session per configured feed group
//! - A single consumer draining the shared event channel
//! - Termination accounting and metrics

use crate::config::{AppConfig, SessionConfig};
use crate::error::{AppError, AppResult};
use bittrex_core::{MarketEvent, MarketSymbol};
use bittrex_rest::{Fetch, HttpFetcher, MarketDataClient};
use bittrex_telemetry::Metrics;
use bittrex_ws::{
    Credentials, EventSink, HubConfig, HubConnector, Session, SessionHandle, SignalrConnector,
    Termination,
};
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of one [`Application::run`].
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Events received by the consumer, by kind label.
    pub events: BTreeMap<&'static str, u64>,
    /// Why each session ended, in configuration order.
    pub terminations: Vec<(String, Termination)>,
}

impl RunSummary {
    pub fn total_events(&self) -> u64 {
        self.events.values().sum()
    }

    pub fn termination(&self, session: &str) -> Option<&Termination> {
        self.terminations
            .iter()
            .find(|(name, _)| name == session)
            .map(|(_, termination)| termination)
    }
}

/// Main application.
pub struct Application {
    config: AppConfig,
    credentials: Option<Credentials>,
    shutdown: CancellationToken,
}

impl Application {
    /// Create a new application.
    ///
    /// Credentials are only used by sessions with account feeds.
    pub fn new(config: AppConfig, credentials: Option<Credentials>) -> AppResult<Self> {
        config.validate()?;

        if config.needs_credentials() && credentials.is_none() {
            warn!("Account feeds configured without API credentials; those sessions will fail");
        }

        Ok(Self {
            config,
            credentials,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Cancelling this token stops every session.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// REST client built from the `[rest]` section.
    pub fn rest_client(&self) -> AppResult<MarketDataClient<HttpFetcher>> {
        let fetcher =
            HttpFetcher::with_base_url(&self.config.rest.base_url, self.config.rest.timeout())?;
        Ok(MarketDataClient::new(fetcher))
    }

    /// Markets referenced by any configured feed.
    pub fn configured_markets(&self) -> AppResult<BTreeSet<MarketSymbol>> {
        let mut markets = BTreeSet::new();
        for session in &self.config.sessions {
            for feed in session.parse_feeds()? {
                if let Some(symbol) = feed.symbol() {
                    markets.insert(symbol.clone());
                }
            }
        }
        Ok(markets)
    }

    /// Check configured markets against the exchange listing.
    ///
    /// Unknown markets are an error. Markets that are listed but not
    /// online only produce a warning since they may come back.
    pub async fn run_preflight<F: Fetch>(&self, client: &MarketDataClient<F>) -> AppResult<()> {
        if !self.config.rest.preflight {
            info!("Preflight disabled, skipping");
            return Ok(());
        }

        let server_time = client.ping().await?;
        let skew_ms = (Utc::now() - server_time).num_milliseconds();
        info!(%server_time, skew_ms, "Exchange reachable");

        let wanted = self.configured_markets()?;
        if wanted.is_empty() {
            info!("No market-specific feeds configured");
            return Ok(());
        }

        let markets = client.markets().await?;
        let listed: HashMap<&MarketSymbol, bool> = markets
            .iter()
            .map(|market| (&market.symbol, market.is_online()))
            .collect();

        let unknown: Vec<&str> = wanted
            .iter()
            .filter(|symbol| !listed.contains_key(symbol))
            .map(MarketSymbol::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(AppError::Preflight(format!(
                "markets not listed: {}",
                unknown.join(", ")
            )));
        }

        for symbol in &wanted {
            if listed.get(symbol) == Some(&false) {
                warn!(%symbol, "Market is not online");
            }
        }

        info!(markets = wanted.len(), "Preflight passed");
        Ok(())
    }

    /// Run every session against the exchange until they all end or
    /// Ctrl-C is received.
    pub async fn run(self) -> AppResult<RunSummary> {
        let shutdown = self.shutdown.clone();
        let ctrl_c = tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => info!("Shutdown signal received"),
                        Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
                    }
                    shutdown.cancel();
                }
            }
        });

        let summary = self
            .run_with(|hub| SignalrConnector::new(hub.clone()))
            .await;
        ctrl_c.abort();
        summary
    }

    /// Run every session with connectors built by `make_connector`.
    pub async fn run_with<C, M>(self, make_connector: M) -> AppResult<RunSummary>
    where
        C: HubConnector,
        M: Fn(&HubConfig) -> C,
    {
        let (tx, rx) = mpsc::channel::<MarketEvent>(self.config.channel_capacity);
        let consumer = tokio::spawn(consume(rx, self.config.stats_interval()));

        let mut handles: Vec<(String, SessionHandle)> =
            Vec::with_capacity(self.config.sessions.len());
        for session_config in &self.config.sessions {
            let connector = make_connector(&self.config.hub);
            let handle = self.spawn_session(session_config, connector, tx.clone())?;
            Metrics::session_started();
            handles.push((session_config.name.clone(), handle));
        }
        // The consumer ends once every session has released its sender.
        drop(tx);

        info!(sessions = handles.len(), "All sessions started");

        let mut summary = RunSummary::default();
        let mut failed = None;
        for (name, handle) in handles {
            let stats = handle.stats();
            let termination = match handle.join().await {
                Ok(termination) => termination,
                Err(e) => {
                    // Stop the remaining sessions, then keep joining them.
                    warn!(session = %name, error = %e, "Session task failed");
                    self.shutdown.cancel();
                    if failed.is_none() {
                        failed = Some(e);
                    }
                    continue;
                }
            };

            Metrics::session_finished(
                &name,
                termination.reason(),
                stats.dropped(),
                stats.decode_errors(),
            );
            if termination.is_requested() {
                info!(session = %name, delivered = stats.delivered(), "Session stopped");
            } else {
                warn!(
                    session = %name,
                    reason = termination.reason(),
                    error = %termination,
                    delivered = stats.delivered(),
                    dropped = stats.dropped(),
                    decode_errors = stats.decode_errors(),
                    "Session terminated"
                );
            }
            summary.terminations.push((name, termination));
        }

        let events = consumer.await?;
        if let Some(e) = failed {
            return Err(e.into());
        }
        summary.events = events;
        info!(total_events = summary.total_events(), "Shutting down");
        Ok(summary)
    }

    fn spawn_session<C: HubConnector>(
        &self,
        session_config: &SessionConfig,
        connector: C,
        tx: mpsc::Sender<MarketEvent>,
    ) -> AppResult<SessionHandle> {
        let feeds = session_config.parse_feeds()?;
        let mut session =
            Session::new(connector, self.config.hub.clone(), feeds, EventSink::new(tx))
                .with_stop_token(self.shutdown.child_token());

        if let Some(credentials) = &self.credentials {
            if session_config.is_private() {
                session = session.with_credentials(credentials.clone());
            }
        }

        info!(session = %session_config.name, topics = ?session.topics(), "Starting session");
        Ok(session.spawn())
    }
}

/// Drain the shared channel, counting events by kind.
async fn consume(
    mut rx: mpsc::Receiver<MarketEvent>,
    stats_interval: Duration,
) -> BTreeMap<&'static str, u64> {
    let mut counts: BTreeMap<&'static str, u64> = BTreeMap::new();
    let mut stats = interval_at(Instant::now() + stats_interval, stats_interval);

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                let kind = event.label();
                *counts.entry(kind).or_default() += 1;
                Metrics::event_forwarded(kind);
                let symbol = event.symbol().map(MarketSymbol::as_str);
                if let MarketEvent::OrderBook(book) = &event {
                    debug!(
                        kind,
                        ?symbol,
                        best_bid = ?book.best_bid().map(|level| level.rate),
                        best_ask = ?book.best_ask().map(|level| level.rate),
                        "Event received"
                    );
                } else {
                    debug!(kind, ?symbol, "Event received");
                }
            }
            _ = stats.tick() => {
                info!(?counts, "Event counts");
            }
        }
    }

    counts
}


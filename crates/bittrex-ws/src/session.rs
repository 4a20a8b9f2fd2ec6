//! Streaming session: one connection, one subscription set, one outcome.
//!
//! Lifecycle: Connecting -> (Authenticating) -> Subscribing -> Streaming ->
//! Terminated. Every path ends in exactly one [`Termination`] and closes the
//! connection once. Sessions do not reconnect; callers decide whether to
//! start a new one.

use crate::auth::{authenticate, Credentials};
use crate::config::HubConfig;
use crate::decode;
use crate::error::{AuthError, SubscribeError, Termination};
use crate::liveness::{LastSeen, LivenessMonitor};
use crate::message::{HubPush, HubResponse};
use crate::sink::{EventSink, Offer};
use crate::transport::{HubConnection, HubConnector};
use bittrex_core::{CandleInterval, Feed, FeedKind, MarketEvent};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Session lifecycle state, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticating,
    Subscribing,
    Streaming,
    Terminated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Subscribing => "subscribing",
            Self::Streaming => "streaming",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Per-session counters.
#[derive(Debug, Default)]
pub struct SessionStats {
    pushes: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
    decode_errors: AtomicU64,
    ignored: AtomicU64,
}

impl SessionStats {
    pub fn record_push(&self) {
        self.pushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_offer(&self, offer: Offer) {
        match offer {
            Offer::Delivered => self.delivered.fetch_add(1, Ordering::Relaxed),
            Offer::Dropped => self.dropped.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// Hub pushes received, including heartbeats.
    pub fn pushes(&self) -> u64 {
        self.pushes.load(Ordering::Relaxed)
    }

    /// Events handed to the consumer.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Events dropped because the consumer was full or gone.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Payloads that failed to decode.
    pub fn decode_errors(&self) -> u64 {
        self.decode_errors.load(Ordering::Relaxed)
    }

    /// Pushes for other hubs, unknown methods or unsubscribed streams.
    pub fn ignored(&self) -> u64 {
        self.ignored.load(Ordering::Relaxed)
    }
}

/// A configured streaming session.
pub struct Session<C: HubConnector> {
    connector: C,
    config: HubConfig,
    feeds: Vec<Feed>,
    kinds: HashSet<FeedKind>,
    credentials: Option<Credentials>,
    sink: EventSink<MarketEvent>,
    stop: CancellationToken,
    stats: Arc<SessionStats>,
}

impl<C: HubConnector> Session<C> {
    pub fn new(
        connector: C,
        config: HubConfig,
        feeds: Vec<Feed>,
        sink: EventSink<MarketEvent>,
    ) -> Self {
        let feeds = normalize_feeds(feeds, config.pin_candle_interval);
        let kinds = feeds.iter().map(Feed::kind).collect();
        Self {
            connector,
            config,
            feeds,
            kinds,
            credentials: None,
            sink,
            stop: CancellationToken::new(),
            stats: Arc::new(SessionStats::default()),
        }
    }

    /// Credentials for private feeds.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Stop the session when `token` is cancelled.
    pub fn with_stop_token(mut self, token: CancellationToken) -> Self {
        self.stop = token;
        self
    }

    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn stats(&self) -> Arc<SessionStats> {
        self.stats.clone()
    }

    pub fn feeds(&self) -> &[Feed] {
        &self.feeds
    }

    /// Subscription topics, `heartbeat` first.
    pub fn topics(&self) -> Vec<String> {
        std::iter::once(Feed::Heartbeat.topic())
            .chain(
                self.feeds
                    .iter()
                    .filter(|feed| **feed != Feed::Heartbeat)
                    .map(Feed::topic),
            )
            .collect()
    }

    /// Run on a background task.
    pub fn spawn(self) -> SessionHandle {
        let stop = self.stop.clone();
        let stats = self.stats.clone();
        let task = tokio::spawn(self.run());
        SessionHandle { stop, stats, task }
    }

    /// Run until the session terminates.
    pub async fn run(self) -> Termination {
        let topics = self.topics();
        info!(topics = ?topics, "Starting session");

        let mut connection = match self.connect().await {
            Ok(connection) => connection,
            Err(termination) => {
                self.log_termination(&termination);
                return termination;
            }
        };

        let termination = self.drive(&mut connection, topics).await;
        connection.close().await;
        self.log_termination(&termination);
        termination
    }

    async fn connect(&self) -> Result<C::Connection, Termination> {
        self.transition(SessionState::Connecting);
        let timeout = self.config.connect_timeout(&self.feeds);

        tokio::select! {
            () = self.stop.cancelled() => Err(Termination::StoppedByCaller),
            connected = tokio::time::timeout(timeout, self.connector.connect()) => match connected {
                Ok(Ok(connection)) => Ok(connection),
                Ok(Err(e)) => Err(Termination::Connect(e)),
                Err(_) => Err(Termination::ConnectTimeout(timeout)),
            },
        }
    }

    /// Everything after the connection is open. The caller closes it.
    async fn drive(&self, connection: &mut C::Connection, topics: Vec<String>) -> Termination {
        if self.feeds.iter().any(Feed::is_private) {
            self.transition(SessionState::Authenticating);
            let Some(credentials) = self.credentials.as_ref() else {
                return Termination::Auth(AuthError::MissingCredentials);
            };

            let invoke_timeout = self.config.invoke_timeout();
            tokio::select! {
                () = self.stop.cancelled() => return Termination::StoppedByCaller,
                authenticated = tokio::time::timeout(invoke_timeout, authenticate(connection, credentials)) => {
                    match authenticated {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => return Termination::Auth(e),
                        Err(_) => {
                            return Termination::Auth(AuthError::Call(format!(
                                "timed out after {invoke_timeout:?}"
                            )))
                        }
                    }
                }
            }
        }

        self.transition(SessionState::Subscribing);
        tokio::select! {
            () = self.stop.cancelled() => return Termination::StoppedByCaller,
            subscribed = self.subscribe(connection, topics) => {
                if let Err(e) = subscribed {
                    return Termination::Subscribe(e);
                }
            }
        }

        self.transition(SessionState::Streaming);
        self.stream(connection).await
    }

    async fn subscribe(
        &self,
        connection: &mut C::Connection,
        topics: Vec<String>,
    ) -> Result<(), SubscribeError> {
        let invoke_timeout = self.config.invoke_timeout();
        let result = tokio::time::timeout(
            invoke_timeout,
            connection.invoke("Subscribe", vec![json!(topics)]),
        )
        .await
        .map_err(|_| SubscribeError::Timeout(invoke_timeout))?
        .map_err(SubscribeError::Call)?;

        check_subscribe_result(&topics, result)?;
        info!(count = topics.len(), "Subscribed");
        Ok(())
    }

    async fn stream(&self, connection: &mut C::Connection) -> Termination {
        let last_seen = Arc::new(LastSeen::new());
        let mut monitor = LivenessMonitor::spawn(
            last_seen.clone(),
            self.config.liveness_interval(),
            self.config.liveness_threshold(),
        );

        loop {
            tokio::select! {
                biased;

                () = self.stop.cancelled() => return Termination::StoppedByCaller,

                silent_for = monitor.expired() => return Termination::FeedTimeout { silent_for },

                push = connection.next_push() => match push {
                    Some(Ok(push)) => self.route(push, &last_seen),
                    Some(Err(e)) => return Termination::Disconnected(e.to_string()),
                    None => return Termination::Disconnected("hub closed the connection".to_string()),
                },
            }
        }
    }

    fn route(&self, push: HubPush, last_seen: &LastSeen) {
        self.stats.record_push();

        if !push.is_from(&self.config.hub) {
            trace!(hub = %push.hub, method = %push.method, "Ignoring push for another hub");
            self.stats.record_ignored();
            return;
        }

        let Some(kind) = FeedKind::from_method(&push.method) else {
            warn!(method = %push.method, "Unsupported hub method");
            self.stats.record_ignored();
            return;
        };

        if kind == FeedKind::Heartbeat {
            last_seen.touch();
            trace!("Heartbeat");
            return;
        }

        if !self.kinds.contains(&kind) {
            debug!(%kind, "Ignoring push for an unsubscribed stream");
            self.stats.record_ignored();
            return;
        }

        last_seen.touch();

        for (index, arg) in push.args.iter().enumerate() {
            match decode::decode_arg(kind, arg) {
                Ok(envelope) => {
                    trace!(%kind, sequence = ?envelope.sequence(), "Decoded envelope");
                    for event in envelope.into_events() {
                        self.stats.record_offer(self.sink.offer(event));
                    }
                }
                Err(e) => {
                    self.stats.record_decode_error();
                    warn!(%kind, index, error = %e, "Dropping undecodable message");
                }
            }
        }
    }

    fn transition(&self, state: SessionState) {
        debug!(%state, "Session state");
    }

    fn log_termination(&self, termination: &Termination) {
        let stats = &self.stats;
        if termination.is_requested() {
            info!(
                reason = termination.reason(),
                delivered = stats.delivered(),
                dropped = stats.dropped(),
                "Session terminated"
            );
        } else {
            warn!(
                reason = termination.reason(),
                error = %termination,
                delivered = stats.delivered(),
                dropped = stats.dropped(),
                decode_errors = stats.decode_errors(),
                "Session terminated"
            );
        }
        debug!(state = %SessionState::Terminated, "Session state");
    }
}

/// Pin candle feeds to the one-minute topic and drop duplicates.
fn normalize_feeds(feeds: Vec<Feed>, pin_candle_interval: bool) -> Vec<Feed> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(feeds.len());

    for feed in feeds {
        let feed = match feed {
            Feed::Candle { symbol, interval }
                if pin_candle_interval && interval != CandleInterval::Minute1 =>
            {
                warn!(
                    %symbol,
                    requested = %interval,
                    "Candle feeds are pinned to MINUTE_1"
                );
                Feed::Candle {
                    symbol,
                    interval: CandleInterval::Minute1,
                }
            }
            other => other,
        };
        if seen.insert(feed.clone()) {
            normalized.push(feed);
        }
    }
    normalized
}

/// Check the per-topic results of a `Subscribe` call.
fn check_subscribe_result(topics: &[String], result: Value) -> Result<(), SubscribeError> {
    let items = match result {
        Value::Array(items) => items,
        other => {
            debug!(result = %other, "Subscribe returned no per-topic results");
            return Ok(());
        }
    };

    for (topic, item) in topics.iter().zip(items) {
        let response: HubResponse = match serde_json::from_value(item) {
            Ok(response) => response,
            Err(e) => {
                debug!(%topic, error = %e, "Unreadable subscribe result entry");
                continue;
            }
        };
        if !response.success {
            return Err(SubscribeError::Rejected {
                topic: topic.clone(),
                code: response.failure_code(),
            });
        }
    }
    Ok(())
}

/// Handle to a spawned session.
#[derive(Debug)]
pub struct SessionHandle {
    stop: CancellationToken,
    stats: Arc<SessionStats>,
    task: JoinHandle<Termination>,
}

impl SessionHandle {
    /// Ask the session to stop. It ends with [`Termination::StoppedByCaller`]
    /// unless it already ended for another reason.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn stats(&self) -> Arc<SessionStats> {
        self.stats.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to end.
    pub async fn join(self) -> Result<Termination, tokio::task::JoinError> {
        self.task.await
    }
}

//! Hub client error types.

use crate::message::ErrorCode;
use bittrex_core::FeedKind;
use std::time::Duration;
use thiserror::Error;

/// Transport and protocol errors raised by a hub connection.
#[derive(Debug, Error)]
pub enum WsError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed: code={code}, reason={reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("Negotiation failed: {0}")]
    Negotiation(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Hub method {method} failed: {message}")]
    Invocation { method: String, message: String },

    #[error("Tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type WsResult<T> = Result<T, WsError>;

/// Failure to turn one pushed payload into events.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not a string: {0}")]
    NotAString(String),

    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("inflate failed: {0}")]
    Inflate(#[from] std::io::Error),

    #[error("inflated payload is empty")]
    Empty,

    #[error("{kind} pushes carry no payload")]
    NoPayload { kind: FeedKind },

    #[error("unexpected {kind} payload: {source}")]
    Json {
        kind: FeedKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of the `Authenticate` handshake.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    #[error("authentication rejected: {0}")]
    Rejected(ErrorCode),

    #[error("authentication call failed: {0}")]
    Call(String),

    #[error("private feed requested without API credentials")]
    MissingCredentials,

    #[error("invalid API secret: {0}")]
    InvalidSecret(String),
}

/// Failure of the `Subscribe` call.
#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error("subscribe call failed: {0}")]
    Call(#[source] WsError),

    #[error("subscribe call timed out after {0:?}")]
    Timeout(Duration),

    #[error("topic {topic} rejected: {code}")]
    Rejected { topic: String, code: ErrorCode },
}

/// Why a session ended. Every session ends with exactly one of these.
#[derive(Debug, Error)]
pub enum Termination {
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("connect failed: {0}")]
    Connect(#[source] WsError),

    #[error("authentication failed: {0}")]
    Auth(#[source] AuthError),

    #[error("subscribe failed: {0}")]
    Subscribe(#[source] SubscribeError),

    #[error("stopped by caller")]
    StoppedByCaller,

    #[error("disconnected: {0}")]
    Disconnected(String),

    #[error("feed silent for {silent_for:?}")]
    FeedTimeout { silent_for: Duration },
}

impl Termination {
    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ConnectTimeout(_) => "connect_timeout",
            Self::Connect(_) => "connect_error",
            Self::Auth(_) => "auth_error",
            Self::Subscribe(_) => "subscribe_error",
            Self::StoppedByCaller => "stopped_by_caller",
            Self::Disconnected(_) => "disconnected",
            Self::FeedTimeout { .. } => "feed_timeout",
        }
    }

    /// Whether the session ended because the caller asked it to.
    pub fn is_requested(&self) -> bool {
        matches!(self, Self::StoppedByCaller)
    }
}

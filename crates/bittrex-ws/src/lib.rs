//! SignalR hub client for Bittrex v3 push feeds.
//!
//! Provides:
//! - SignalR 1.5 negotiation and hub invocations over WebSocket
//! - Push payload decoding (base64 + raw DEFLATE + JSON)
//! - API-key authentication for private streams
//! - Streaming sessions with liveness monitoring and drop-on-full delivery

pub mod auth;
pub mod config;
pub mod connection;
pub mod decode;
pub mod envelope;
pub mod error;
pub mod liveness;
pub mod message;
pub mod session;
pub mod sink;
pub mod transport;

pub use auth::{authenticate, Challenge, Credentials};
pub use config::HubConfig;
pub use connection::{SignalrConnection, SignalrConnector};
pub use envelope::Envelope;
pub use error::{AuthError, DecodeError, SubscribeError, Termination, WsError, WsResult};
pub use liveness::{LastSeen, LivenessMonitor};
pub use message::{ErrorCode, HubFrame, HubPush, HubResponse};
pub use session::{Session, SessionHandle, SessionState, SessionStats};
pub use sink::{EventSink, Offer};
pub use transport::{HubConnection, HubConnector};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any hub connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

//! SignalR 1.5 transport over WebSocket.
//!
//! Connection setup follows the classic SignalR handshake:
//! 1. `GET /signalr/negotiate` for a connection token
//! 2. WebSocket upgrade on `/signalr/connect`, wait for the init frame
//! 3. `GET /signalr/start` to open the hub

use crate::config::HubConfig;
use crate::error::{WsError, WsResult};
use crate::message::{HubFrame, HubInvocation, HubPush};
use crate::transport::{HubConnection, HubConnector};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

const CLIENT_PROTOCOL: &str = "1.5";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NegotiateResponse {
    connection_token: String,
    connection_id: String,
    #[serde(default)]
    try_web_sockets: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StartResponse {
    response: String,
}

/// Opens SignalR connections to the configured hub.
#[derive(Debug, Clone)]
pub struct SignalrConnector {
    config: HubConfig,
    http: reqwest::Client,
}

impl SignalrConnector {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn connection_data(&self) -> String {
        serde_json::json!([{ "name": self.config.hub }]).to_string()
    }

    fn endpoint(&self, base: &str, path: &str, params: &[(&str, &str)]) -> WsResult<Url> {
        let connection_data = self.connection_data();
        let mut query = vec![
            ("clientProtocol", CLIENT_PROTOCOL),
            ("connectionData", connection_data.as_str()),
        ];
        query.extend_from_slice(params);

        Url::parse_with_params(&format!("{base}/signalr/{path}"), &query)
            .map_err(|e| WsError::ConnectionFailed(format!("invalid hub url: {e}")))
    }

    async fn negotiate(&self) -> WsResult<NegotiateResponse> {
        let url = self.endpoint(&self.config.http_base(), "negotiate", &[])?;
        debug!(%url, "Negotiating SignalR connection");

        let negotiated: NegotiateResponse = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !negotiated.try_web_sockets {
            return Err(WsError::Negotiation(
                "server does not offer the WebSocket transport".to_string(),
            ));
        }
        Ok(negotiated)
    }

    async fn start(&self, token: &str) -> WsResult<()> {
        let url = self.endpoint(
            &self.config.http_base(),
            "start",
            &[("transport", "webSockets"), ("connectionToken", token)],
        )?;

        let started: StartResponse = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if started.response != "started" {
            return Err(WsError::Negotiation(format!(
                "unexpected start response: {}",
                started.response
            )));
        }
        Ok(())
    }
}

impl HubConnector for SignalrConnector {
    type Connection = SignalrConnection;

    async fn connect(&self) -> WsResult<SignalrConnection> {
        let negotiated = self.negotiate().await?;

        let url = self.endpoint(
            &self.config.ws_base(),
            "connect",
            &[
                ("transport", "webSockets"),
                ("connectionToken", &negotiated.connection_token),
            ],
        )?;
        info!(host = %self.config.host, connection_id = %negotiated.connection_id, "Connecting to hub");

        // TCP_NODELAY: pushes are small and latency sensitive
        let (ws_stream, _response) =
            connect_async_tls_with_config(url.as_str(), None, true, None).await?;
        let (write, read) = ws_stream.split();

        let mut connection = SignalrConnection {
            hub: self.config.hub.clone(),
            write,
            read,
            pending: VecDeque::new(),
            next_id: 0,
            malformed_frames: 0,
            closed: false,
        };

        let opened = match connection.wait_for_init().await {
            Ok(()) => self.start(&negotiated.connection_token).await,
            Err(e) => Err(e),
        };
        if let Err(e) = opened {
            connection.close().await;
            return Err(e);
        }

        info!(hub = %self.config.hub, "Hub connection started");
        Ok(connection)
    }
}

/// An open SignalR WebSocket connection.
pub struct SignalrConnection {
    hub: String,
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
    /// Pushes received while waiting for an invocation result.
    pending: VecDeque<HubPush>,
    next_id: u64,
    /// Text frames skipped because they could not be parsed.
    malformed_frames: u64,
    closed: bool,
}

impl SignalrConnection {
    pub fn malformed_frames(&self) -> u64 {
        self.malformed_frames
    }

    async fn wait_for_init(&mut self) -> WsResult<()> {
        loop {
            match self.read_frame().await? {
                HubFrame::Init => return Ok(()),
                HubFrame::Pushes(pushes) => self.pending.extend(pushes),
                HubFrame::KeepAlive | HubFrame::Result(_) => {}
            }
        }
    }

    /// Read the next hub frame, answering transport pings on the way.
    ///
    /// Text frames that do not parse are skipped, so every error returned
    /// here comes from the socket itself.
    async fn read_frame(&mut self) -> WsResult<HubFrame> {
        loop {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => {
                    trace!(len = text.len(), "Hub frame");
                    match HubFrame::parse(&text) {
                        Ok(frame) => return Ok(frame),
                        Err(e) => {
                            self.malformed_frames += 1;
                            warn!(
                                error = %e,
                                malformed_frames = self.malformed_frames,
                                "Skipping malformed hub frame"
                            );
                        }
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    debug!("Received ping, sending pong");
                    self.write.send(Message::Pong(data)).await?;
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (f.code.into(), f.reason.to_string()))
                        .unwrap_or((1000, "Normal close".to_string()));
                    warn!(code, %reason, "Hub closed the connection");
                    return Err(WsError::ConnectionClosed { code, reason });
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => {
                    return Err(WsError::ConnectionClosed {
                        code: 1006,
                        reason: "stream ended".to_string(),
                    })
                }
            }
        }
    }
}

impl HubConnection for SignalrConnection {
    async fn invoke(&mut self, method: &str, args: Vec<Value>) -> WsResult<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let invocation = HubInvocation {
            hub: &self.hub,
            method,
            args,
            id,
        };
        let text = serde_json::to_string(&invocation)?;
        self.write.send(Message::Text(text)).await?;
        debug!(method, id, "Hub method invoked");

        loop {
            match self.read_frame().await? {
                HubFrame::Result(result) if result.id == id => {
                    return result.outcome.map_err(|message| WsError::Invocation {
                        method: method.to_string(),
                        message,
                    });
                }
                HubFrame::Result(other) => {
                    debug!(id = other.id, "Ignoring result of an earlier invocation");
                }
                HubFrame::Pushes(pushes) => self.pending.extend(pushes),
                HubFrame::KeepAlive | HubFrame::Init => {}
            }
        }
    }

    async fn next_push(&mut self) -> Option<WsResult<HubPush>> {
        loop {
            if let Some(push) = self.pending.pop_front() {
                return Some(Ok(push));
            }
            if self.closed {
                return None;
            }

            match self.read_frame().await {
                Ok(HubFrame::Pushes(pushes)) => self.pending.extend(pushes),
                Ok(HubFrame::KeepAlive | HubFrame::Init) => {}
                Ok(HubFrame::Result(result)) => {
                    debug!(id = result.id, "Ignoring unsolicited invocation result");
                }
                Err(WsError::ConnectionClosed { code, reason }) => {
                    debug!(code, %reason, "Hub stream finished");
                    self.closed = true;
                    return None;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.write.send(Message::Close(None)).await {
            debug!(?e, "Failed to send Close frame");
        }
        if let Err(e) = self.write.close().await {
            debug!(?e, "Failed to close WebSocket sink");
        }
        info!("Hub connection closed");
    }
}

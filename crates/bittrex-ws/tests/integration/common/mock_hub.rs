//! Mock SignalR server for transport tests.
//!
//! Serves the negotiate/start HTTP endpoints and the WebSocket connect
//! endpoint on one port:
//! - Sends the init frame (or a Close frame) after the upgrade
//! - Answers `Subscribe` and `Authenticate` invocations
//! - Pushes scripted frames after a successful subscribe
//! - Records every text frame and counts Close frames

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};

#[derive(Debug, Clone)]
pub struct MockHubBehavior {
    pub offer_websockets: bool,
    pub auth_success: bool,
    /// Raw frames sent right after the `Subscribe` result.
    pub frames_after_subscribe: Vec<String>,
    /// Send a Close frame where the init frame belongs.
    pub close_before_init: bool,
}

impl Default for MockHubBehavior {
    fn default() -> Self {
        Self {
            offer_websockets: true,
            auth_success: true,
            frames_after_subscribe: Vec::new(),
            close_before_init: false,
        }
    }
}

#[derive(Default)]
struct ServerState {
    received: Mutex<Vec<String>>,
    http_paths: Mutex<Vec<String>>,
    close_frames: AtomicUsize,
}

pub struct MockHubServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    state: Arc<ServerState>,
}

impl MockHubServer {
    pub async fn start(behavior: MockHubBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(ServerState::default());
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let state_clone = state.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        tokio::spawn(handle_connection(stream, behavior.clone(), state_clone.clone()));
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            state,
        }
    }

    /// Host and port, suitable for `HubConfig::host`.
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub async fn received_frames(&self) -> Vec<Value> {
        self.state
            .received
            .lock()
            .await
            .iter()
            .filter_map(|text| serde_json::from_str(text).ok())
            .collect()
    }

    pub async fn http_paths(&self) -> Vec<String> {
        self.state.http_paths.lock().await.clone()
    }

    pub fn close_frames(&self) -> usize {
        self.state.close_frames.load(Ordering::SeqCst)
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_connection(stream: TcpStream, behavior: MockHubBehavior, state: Arc<ServerState>) {
    let mut head = [0u8; 1024];
    let n = match stream.peek(&mut head).await {
        Ok(n) => n,
        Err(_) => return,
    };
    let request_line = String::from_utf8_lossy(&head[..n])
        .lines()
        .next()
        .unwrap_or_default()
        .to_string();
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .split('?')
        .next()
        .unwrap_or_default()
        .to_string();

    match path.as_str() {
        "/signalr/connect" => serve_socket(stream, behavior, state).await,
        "/signalr/negotiate" => {
            state.http_paths.lock().await.push(path);
            let body = json!({
                "Url": "/signalr",
                "ConnectionToken": "token+with/slash",
                "ConnectionId": "conn-1",
                "KeepAliveTimeout": 20.0,
                "DisconnectTimeout": 30.0,
                "TryWebSockets": behavior.offer_websockets,
                "ProtocolVersion": "1.5"
            });
            respond_json(stream, 200, &body).await;
        }
        "/signalr/start" => {
            state.http_paths.lock().await.push(path);
            respond_json(stream, 200, &json!({"Response": "started"})).await;
        }
        _ => respond_json(stream, 404, &json!({})).await,
    }
}

async fn respond_json(mut stream: TcpStream, status: u16, body: &Value) {
    // Consume the request head.
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let body = body.to_string();
    let reason = if status == 200 { "OK" } else { "Not Found" };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn serve_socket(stream: TcpStream, behavior: MockHubBehavior, state: Arc<ServerState>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };
    let (mut write, mut read) = ws_stream.split();

    let first = if behavior.close_before_init {
        Message::Close(None)
    } else {
        Message::Text(json!({"C": "d-0,0|A,0", "S": 1, "M": []}).to_string())
    };
    if write.send(first).await.is_err() {
        return;
    }

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                state.received.lock().await.push(text.clone());
                let Ok(frame) = serde_json::from_str::<Value>(&text) else {
                    continue;
                };

                let id = frame["I"].as_u64().unwrap_or_default().to_string();
                match frame["M"].as_str() {
                    Some("Subscribe") => {
                        let topics = frame["A"][0].as_array().map(Vec::len).unwrap_or_default();
                        let results: Vec<Value> = (0..topics)
                            .map(|_| json!({"Success": true, "ErrorCode": null}))
                            .collect();
                        let reply = json!({"R": results, "I": id});
                        let _ = write.send(Message::Text(reply.to_string())).await;

                        for pushed in &behavior.frames_after_subscribe {
                            let _ = write.send(Message::Text(pushed.clone())).await;
                        }
                    }
                    Some("Authenticate") => {
                        let result = if behavior.auth_success {
                            json!({"Success": true, "ErrorCode": null})
                        } else {
                            json!({"Success": false, "ErrorCode": "INVALID_SIGNATURE"})
                        };
                        let reply = json!({"R": result, "I": id});
                        let _ = write.send(Message::Text(reply.to_string())).await;
                    }
                    _ => {
                        let reply = json!({"E": "unknown method", "I": id});
                        let _ = write.send(Message::Text(reply.to_string())).await;
                    }
                }
            }
            Ok(Message::Ping(data)) => {
                let _ = write.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => {
                state.close_frames.fetch_add(1, Ordering::SeqCst);
                break;
            }
            Err(_) => break,
            _ => {}
        }
    }
}

//! In-memory hub and REST endpoints for driving the application.

use bittrex_rest::{Fetch, RestError, RestResult};
use bittrex_ws::decode::encode;
use bittrex_ws::{HubConnection, HubConnector, HubPush, WsError, WsResult};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const HUB: &str = "C3";

pub fn push(method: &str, envelope: &Value) -> HubPush {
    let payload = encode(envelope.to_string().as_bytes()).unwrap();
    HubPush::new(HUB, method, vec![Value::String(payload)])
}

pub fn trade_push(symbol: &str, ids: &[&str]) -> HubPush {
    let deltas: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "executedAt": "2021-04-01T10:00:00Z",
                "quantity": "0.25",
                "rate": "57000.00",
                "takerSide": "BUY",
            })
        })
        .collect();
    push(
        "trade",
        &json!({"sequence": 1, "marketSymbol": symbol, "deltas": deltas}),
    )
}

pub fn order_book_push(symbol: &str) -> HubPush {
    push(
        "orderBook",
        &json!({
            "marketSymbol": symbol,
            "depth": 25,
            "sequence": 9,
            "bidDeltas": [{"quantity": "1.0", "rate": "99.5"}],
            "askDeltas": [{"quantity": "2.0", "rate": "100.5"}],
        }),
    )
}

/// Pushes one connection delivers, then either hangs up or goes quiet.
#[derive(Debug, Clone, Default)]
pub struct FeedScript {
    pub pushes: Vec<HubPush>,
    pub hang_up: bool,
    /// Panic inside `connect`, killing the session task.
    pub panic_on_connect: bool,
}

/// Hands out one script per connector, in creation order.
#[derive(Debug, Default)]
pub struct FakeExchange {
    scripts: Mutex<VecDeque<FeedScript>>,
    methods: Mutex<Vec<String>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

impl FakeExchange {
    pub fn new(scripts: Vec<FeedScript>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            ..Default::default()
        })
    }

    pub fn connector(self: &Arc<Self>) -> FakeConnector {
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
        FakeConnector {
            script,
            exchange: self.clone(),
        }
    }

    pub fn methods(&self) -> Vec<String> {
        self.methods.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub struct FakeConnector {
    script: FeedScript,
    exchange: Arc<FakeExchange>,
}

impl HubConnector for FakeConnector {
    type Connection = FakeConnection;

    async fn connect(&self) -> WsResult<FakeConnection> {
        self.exchange.connects.fetch_add(1, Ordering::SeqCst);
        if self.script.panic_on_connect {
            panic!("connector failed");
        }
        Ok(FakeConnection {
            pushes: self.script.pushes.iter().cloned().collect(),
            hang_up: self.script.hang_up,
            exchange: self.exchange.clone(),
        })
    }
}

pub struct FakeConnection {
    pushes: VecDeque<HubPush>,
    hang_up: bool,
    exchange: Arc<FakeExchange>,
}

impl HubConnection for FakeConnection {
    async fn invoke(&mut self, method: &str, args: Vec<Value>) -> WsResult<Value> {
        self.exchange
            .methods
            .lock()
            .unwrap()
            .push(method.to_string());

        match method {
            "Subscribe" => {
                let topics = args
                    .first()
                    .and_then(Value::as_array)
                    .map(Vec::len)
                    .unwrap_or_default();
                Ok(Value::Array(
                    (0..topics)
                        .map(|_| json!({"Success": true, "ErrorCode": null}))
                        .collect(),
                ))
            }
            "Authenticate" => Ok(json!({"Success": true, "ErrorCode": null})),
            other => Err(WsError::Invocation {
                method: other.to_string(),
                message: "unknown hub method".to_string(),
            }),
        }
    }

    async fn next_push(&mut self) -> Option<WsResult<HubPush>> {
        match self.pushes.pop_front() {
            Some(push) => Some(Ok(push)),
            None if self.hang_up => None,
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.exchange.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// REST endpoints served from canned bodies.
#[derive(Default)]
pub struct CannedRest {
    bodies: HashMap<String, String>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl CannedRest {
    /// Serves `ping` and a `markets` listing built from `(symbol, status)`.
    pub fn with_markets(markets: &[(&str, &str)]) -> Self {
        let listing: Vec<Value> = markets
            .iter()
            .map(|(symbol, status)| {
                let (base, quote) = symbol.split_once('-').unwrap();
                json!({
                    "symbol": symbol,
                    "baseCurrencySymbol": base,
                    "quoteCurrencySymbol": quote,
                    "minTradeSize": "0.0001",
                    "precision": 3,
                    "status": status,
                    "createdAt": "2019-01-01T00:00:00Z",
                })
            })
            .collect();

        let mut rest = Self::default();
        rest.bodies.insert(
            "ping".to_string(),
            json!({"serverTime": chrono::Utc::now().timestamp_millis()}).to_string(),
        );
        rest.bodies
            .insert("markets".to_string(), Value::Array(listing).to_string());
        rest
    }

    /// Paths requested so far; stays readable after the fetcher is moved.
    pub fn request_log(&self) -> Arc<Mutex<Vec<String>>> {
        self.requested.clone()
    }
}

impl Fetch for CannedRest {
    async fn fetch(&self, path: &str) -> RestResult<Vec<u8>> {
        self.requested.lock().unwrap().push(path.to_string());
        self.bodies
            .get(path)
            .map(|body| body.clone().into_bytes())
            .ok_or_else(|| RestError::Api {
                status: 404,
                code: "NOT_FOUND".to_string(),
            })
    }
}

//! SignalR 1.5 wire frames.
//!
//! Client to server:
//! - Invocation: `{"H":"c3","M":"Subscribe","A":[["heartbeat","trade_BTC-USD"]],"I":0}`
//!
//! Server to client:
//! - Keep-alive: `{}`
//! - Init: `{"C":"d-..","S":1,"M":[]}`
//! - Pushes: `{"C":"d-..","M":[{"H":"C3","M":"trade","A":["<base64>"]}]}`
//! - Invocation result: `{"R":[{"Success":true,"ErrorCode":null}],"I":"0"}`
//! - Invocation error: `{"E":"message","I":"0"}`

use crate::error::{WsError, WsResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

/// Hub method invocation sent by the client.
#[derive(Debug, Clone, Serialize)]
pub struct HubInvocation<'a> {
    #[serde(rename = "H")]
    pub hub: &'a str,
    #[serde(rename = "M")]
    pub method: &'a str,
    #[serde(rename = "A")]
    pub args: Vec<Value>,
    #[serde(rename = "I")]
    pub id: u64,
}

/// Client method pushed by the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubPush {
    /// Hub that produced the push.
    #[serde(rename = "H")]
    pub hub: String,
    /// Client method name (e.g. "trade", "heartbeat").
    #[serde(rename = "M")]
    pub method: String,
    /// One compressed payload per message.
    #[serde(rename = "A", default)]
    pub args: Vec<Value>,
}

impl HubPush {
    pub fn new(hub: impl Into<String>, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            hub: hub.into(),
            method: method.into(),
            args,
        }
    }

    pub fn is_from(&self, hub: &str) -> bool {
        self.hub.eq_ignore_ascii_case(hub)
    }
}

/// Outcome of one hub invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResult {
    pub id: u64,
    pub outcome: Result<Value, String>,
}

/// A decoded server frame.
#[derive(Debug, Clone, PartialEq)]
pub enum HubFrame {
    KeepAlive,
    /// Transport is ready for invocations.
    Init,
    Pushes(Vec<HubPush>),
    Result(InvocationResult),
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "S")]
    init: Option<u8>,
    #[serde(rename = "M", default)]
    messages: Vec<Value>,
    #[serde(rename = "I")]
    invocation_id: Option<Value>,
    #[serde(rename = "R")]
    result: Option<Value>,
    #[serde(rename = "E")]
    error: Option<String>,
}

impl HubFrame {
    /// Parse one server frame.
    ///
    /// Push entries that are not valid client method calls are logged and
    /// skipped; the rest of the frame is kept.
    pub fn parse(text: &str) -> WsResult<Self> {
        let raw: RawFrame = serde_json::from_str(text)?;

        if let Some(id) = raw.invocation_id {
            let id = parse_invocation_id(&id)?;
            let outcome = match raw.error {
                Some(message) => Err(message),
                None => Ok(raw.result.unwrap_or(Value::Null)),
            };
            return Ok(Self::Result(InvocationResult { id, outcome }));
        }

        if raw.init == Some(1) {
            return Ok(Self::Init);
        }

        if raw.messages.is_empty() {
            return Ok(Self::KeepAlive);
        }

        let pushes = raw
            .messages
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value::<HubPush>(entry) {
                Ok(push) => Some(push),
                Err(e) => {
                    warn!(index, error = %e, "Skipping malformed push entry");
                    None
                }
            })
            .collect();
        Ok(Self::Pushes(pushes))
    }
}

fn parse_invocation_id(id: &Value) -> WsResult<u64> {
    let parsed = match id {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    };
    parsed.ok_or_else(|| WsError::Protocol(format!("invalid invocation id: {id}")))
}

/// Error code reported by the hub.
///
/// Usually a string such as `"INVALID_SIGNATURE"`; any other JSON is kept
/// verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Code(String),
    Payload(Value),
}

impl ErrorCode {
    pub fn code(code: impl Into<String>) -> Self {
        Self::Code(code.into())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => f.write_str(code),
            Self::Payload(value) => write!(f, "{value}"),
        }
    }
}

/// Per-call response of `Authenticate` and of each `Subscribe` topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubResponse {
    #[serde(rename = "Success")]
    pub success: bool,
    #[serde(rename = "ErrorCode", default)]
    pub error_code: Option<ErrorCode>,
}

impl HubResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error_code: None,
        }
    }

    pub fn failed(code: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: Some(ErrorCode::code(code)),
        }
    }

    /// Error code of a failed call, `"UNKNOWN"` when the hub sent none.
    pub fn failure_code(&self) -> ErrorCode {
        self.error_code
            .clone()
            .unwrap_or_else(|| ErrorCode::code("UNKNOWN"))
    }
}

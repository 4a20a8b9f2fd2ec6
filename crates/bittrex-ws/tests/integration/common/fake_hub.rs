//! In-memory hub for driving sessions without sockets.
//!
//! A [`HubScript`] describes how the fake behaves: connect delay or failure,
//! `Authenticate`/`Subscribe` responses and the pushes delivered once
//! streaming starts. Every call is recorded in a shared [`CallLog`].

use bittrex_ws::{HubConnection, HubConnector, HubPush, WsError, WsResult};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One step of the scripted push stream.
#[derive(Debug, Clone)]
pub enum Step {
    Push(HubPush),
    Pause(Duration),
    Fail(String),
}

#[derive(Debug, Clone)]
pub struct HubScript {
    pub connect_delay: Option<Duration>,
    pub connect_error: Option<String>,
    pub auth_response: Value,
    /// `None` accepts every topic.
    pub subscribe_response: Option<Value>,
    pub steps: Vec<Step>,
    /// Close the stream after the last step instead of going quiet.
    pub hang_up: bool,
}

impl Default for HubScript {
    fn default() -> Self {
        Self {
            connect_delay: None,
            connect_error: None,
            auth_response: json!({"Success": true, "ErrorCode": null}),
            subscribe_response: None,
            steps: Vec::new(),
            hang_up: false,
        }
    }
}

impl HubScript {
    pub fn with_steps(steps: Vec<Step>) -> Self {
        Self {
            steps,
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct CallLog {
    invocations: Mutex<Vec<(String, Vec<Value>)>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

impl CallLog {
    pub fn methods(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(|(method, _)| method.clone())
            .collect()
    }

    pub fn args_of(&self, method: &str) -> Option<Vec<Value>> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, args)| args.clone())
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub struct FakeConnector {
    script: HubScript,
    log: Arc<CallLog>,
}

impl FakeConnector {
    pub fn new(script: HubScript) -> (Self, Arc<CallLog>) {
        let log = Arc::new(CallLog::default());
        (
            Self {
                script,
                log: log.clone(),
            },
            log,
        )
    }
}

impl HubConnector for FakeConnector {
    type Connection = FakeConnection;

    async fn connect(&self) -> WsResult<FakeConnection> {
        self.log.connects.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.script.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.script.connect_error {
            return Err(WsError::ConnectionFailed(reason.clone()));
        }

        Ok(FakeConnection {
            script: self.script.clone(),
            steps: self.script.steps.iter().cloned().collect(),
            log: self.log.clone(),
        })
    }
}

pub struct FakeConnection {
    script: HubScript,
    steps: VecDeque<Step>,
    log: Arc<CallLog>,
}

impl HubConnection for FakeConnection {
    async fn invoke(&mut self, method: &str, args: Vec<Value>) -> WsResult<Value> {
        self.log
            .invocations
            .lock()
            .unwrap()
            .push((method.to_string(), args.clone()));

        match method {
            "Authenticate" => Ok(self.script.auth_response.clone()),
            "Subscribe" => match &self.script.subscribe_response {
                Some(response) => Ok(response.clone()),
                None => {
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
            },
            other => Err(WsError::Invocation {
                method: other.to_string(),
                message: "unknown hub method".to_string(),
            }),
        }
    }

    async fn next_push(&mut self) -> Option<WsResult<HubPush>> {
        loop {
            match self.steps.pop_front() {
                Some(Step::Push(push)) => return Some(Ok(push)),
                Some(Step::Pause(duration)) => tokio::time::sleep(duration).await,
                Some(Step::Fail(reason)) => {
                    return Some(Err(WsError::ConnectionClosed { code: 1006, reason }))
                }
                None if self.script.hang_up => return None,
                None => std::future::pending::<()>().await,
            }
        }
    }

    async fn close(&mut self) {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
    }
}

//! Seams between the session logic and the hub transport.
//!
//! [`crate::connection::SignalrConnector`] is the production implementation;
//! tests drive sessions through scripted fakes.

use crate::error::WsResult;
use crate::message::HubPush;
use serde_json::Value;
use std::future::Future;

/// Opens hub connections.
pub trait HubConnector: Send + Sync + 'static {
    type Connection: HubConnection;

    /// Establish a connection that is ready for invocations.
    fn connect(&self) -> impl Future<Output = WsResult<Self::Connection>> + Send;
}

/// An open hub connection.
pub trait HubConnection: Send + 'static {
    /// Invoke a hub method and wait for its result.
    ///
    /// Pushes that arrive while waiting are kept for [`Self::next_push`].
    fn invoke(
        &mut self,
        method: &str,
        args: Vec<Value>,
    ) -> impl Future<Output = WsResult<Value>> + Send;

    /// Next client method pushed by the server.
    ///
    /// `None` once the transport is gone. Cancel-safe.
    fn next_push(&mut self) -> impl Future<Output = Option<WsResult<HubPush>>> + Send;

    /// Close the transport. Calling it again has no effect.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

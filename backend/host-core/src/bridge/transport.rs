use crate::dispatch::Dispatcher;
use crate::events::{EventBus, EventReceiver};
use crate::protocol::Failure;

use std::future::Future;

use serde_json::Value;

/// How the Bridge reaches the host.
pub trait Transport: Send + Sync + 'static {
    /// Perform one request/response call.
    fn invoke(
        &self,
        channel: &str,
        payload: Value,
    ) -> impl Future<Output = Result<Value, Failure>> + Send;

    /// A fresh receiver of host events, in emission order per channel.
    fn events(&self) -> EventReceiver;
}

/// In-process transport straight onto a dispatcher and event bus.
#[derive(Clone)]
pub struct LocalTransport {
    dispatcher: Dispatcher,
    events: EventBus,
}

impl LocalTransport {
    pub fn new(dispatcher: Dispatcher, events: EventBus) -> Self {
        Self { dispatcher, events }
    }
}

impl Transport for LocalTransport {
    fn invoke(
        &self,
        channel: &str,
        payload: Value,
    ) -> impl Future<Output = Result<Value, Failure>> + Send {
        self.dispatcher.dispatch(channel, payload)
    }

    fn events(&self) -> EventReceiver {
        self.events.subscribe()
    }
}

//! Host-side request dispatcher.
//!
//! The dispatcher owns the routing table from [`RequestChannel`] to handler.
//! For every call it:
//!
//! 1. resolves the runtime id through the channel registry (unknown ids fail
//!    closed with `UnknownChannel`)
//! 2. takes the route's resource lock if the route mutates a singleton
//!    resource (held elsewhere → `Busy`)
//! 3. runs the handler in its own task, so a panicking handler becomes a
//!    `HandlerFault` and a dropped caller cannot abort a mutation halfway
//! 4. shapes any [`HandlerError`] into a [`Failure`]
//!
//! Routes are fixed once [`DispatcherBuilder::build`] returns.

mod resource;

pub use resource::{Resource, ResourceGuard, ResourceLocks};

use crate::channel::{self, ChannelKind, RequestChannel};
use crate::error::dispatch::DispatchError;
use crate::error::handler::HandlerError;
use crate::protocol::Failure;

use common::ErrorLocation;

use std::collections::HashMap;
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use log::{debug, error, warn};
use serde_json::Value;

pub type HandlerResult = Result<Value, HandlerError>;
pub type HandlerFuture = BoxFuture<'static, HandlerResult>;

/// A request handler: JSON payload in, JSON result out.
pub trait RequestHandler: Send + Sync + 'static {
    fn call(&self, payload: Value) -> HandlerFuture;
}

impl<F, Fut> RequestHandler for F
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, payload: Value) -> HandlerFuture {
        Box::pin(self(payload))
    }
}

struct Route {
    handler: Arc<dyn RequestHandler>,
    resource: Option<Resource>,
}

#[derive(Default)]
pub struct DispatcherBuilder {
    routes: HashMap<RequestChannel, Route>,
    locks: Option<ResourceLocks>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share resource locks with components that mutate outside the
    /// dispatcher (e.g. the update controller's background download).
    pub fn with_locks(mut self, locks: ResourceLocks) -> Self {
        self.locks = Some(locks);
        self
    }

    /// Register a read-only or self-serializing handler.
    #[track_caller]
    pub fn register<H: RequestHandler>(
        &mut self,
        channel: RequestChannel,
        handler: H,
    ) -> Result<&mut Self, DispatchError> {
        self.insert(channel, None, Arc::new(handler))
    }

    /// Register a handler that mutates `resource`; concurrent calls to any
    /// route on the same resource are rejected with `Busy`.
    #[track_caller]
    pub fn register_exclusive<H: RequestHandler>(
        &mut self,
        channel: RequestChannel,
        resource: Resource,
        handler: H,
    ) -> Result<&mut Self, DispatchError> {
        self.insert(channel, Some(resource), Arc::new(handler))
    }

    #[track_caller]
    fn insert(
        &mut self,
        channel: RequestChannel,
        resource: Option<Resource>,
        handler: Arc<dyn RequestHandler>,
    ) -> Result<&mut Self, DispatchError> {
        if self.routes.contains_key(&channel) {
            return Err(DispatchError::DuplicateHandler {
                channel,
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.routes.insert(channel, Route { handler, resource });
        Ok(self)
    }

    /// Build, allowing channels without a handler (they answer `HandlerFault`).
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            routes: Arc::new(self.routes),
            locks: self.locks.unwrap_or_default(),
        }
    }

    /// Build, requiring a handler for every registered request channel.
    #[track_caller]
    pub fn build_complete(self) -> Result<Dispatcher, DispatchError> {
        let missing: Vec<_> = RequestChannel::ALL
            .into_iter()
            .filter(|channel| !self.routes.contains_key(channel))
            .collect();

        if !missing.is_empty() {
            return Err(DispatchError::MissingHandlers {
                channels: missing,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(self.build())
    }
}

/// Cheaply cloneable handle to the routing table.
#[derive(Clone)]
pub struct Dispatcher {
    routes: Arc<HashMap<RequestChannel, Route>>,
    locks: ResourceLocks,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Dispatch a request presented with a runtime channel id.
    pub async fn dispatch(&self, channel_id: &str, payload: Value) -> Result<Value, Failure> {
        let Some(channel) = channel::request_channel(channel_id) else {
            match channel::kind_of(channel_id) {
                ChannelKind::Event => {
                    warn!("Rejected invoke on event channel {channel_id}");
                }
                _ => warn!(
                    "Rejected unknown channel {channel_id:?} (possible tampering or version mismatch)"
                ),
            }
            return Err(Failure::unknown_channel(channel_id));
        };

        self.dispatch_channel(channel, payload).await
    }

    pub async fn dispatch_channel(
        &self,
        channel: RequestChannel,
        payload: Value,
    ) -> Result<Value, Failure> {
        let Some(route) = self.routes.get(&channel) else {
            error!("No handler registered for {channel}");
            return Err(Failure::handler_fault(format!(
                "{channel} is not available on this host"
            )));
        };

        let guard = match route.resource {
            Some(resource) => match self.locks.try_acquire(resource) {
                Ok(guard) => Some(guard),
                Err(failure) => {
                    debug!("Rejected {channel}: {resource} busy");
                    return Err(failure);
                }
            },
            None => None,
        };

        debug!("Dispatching {channel}");

        let future = route.handler.call(payload);
        let task = tokio::spawn(async move {
            let result = future.await;
            drop(guard);
            result
        });

        match task.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e.into_failure(channel.as_str())),
            Err(join_error) => {
                error!("Handler for {channel} aborted: {join_error}");
                Err(Failure::handler_fault(format!("{channel} failed unexpectedly")))
            }
        }
    }

    pub fn has_handler(&self, channel: RequestChannel) -> bool {
        self.routes.contains_key(&channel)
    }

    pub fn locks(&self) -> &ResourceLocks {
        &self.locks
    }
}

/// Deserialize a request payload, treating `null` as an empty object so
/// optional-only payloads may be omitted.
pub fn parse_payload<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T, HandlerError> {
    let payload = match payload {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    Ok(serde_json::from_value(payload)?)
}

/// Serialize a handler result.
pub fn to_payload<T: serde::Serialize>(value: &T) -> HandlerResult {
    serde_json::to_value(value)
        .map_err(|e| HandlerError::internal(format!("Failed to serialize result: {e}")))
}

//! Bridge Surface: the only object the UI process talks to.
//!
//! ```text
//! UI code ──► Bridge::account().switch(id)
//!               │  registry check, timeout
//!               ▼
//!           Transport ── LocalTransport (in process) / WsTransport (IPC)
//!               │
//!               ▼
//!           Dispatcher ──► handler
//!
//! host EventBus ──► Transport::events() ──► pump task ──► ListenerRegistry
//! ```
//!
//! Every call returns `Result<T, Failure>`; nothing on this surface panics
//! or returns a transport-specific error once the Bridge exists.

mod api;
mod listeners;
mod transport;
mod ws_transport;

pub use api::{
    AccountApi, AccountChanges, AppApi, AuthApi, AutoLaunchApi, ConfigApi, Enabled, LogApi,
    LogExport, LoginResult, NetworkApi, NewAccount, NewWifiProfile, NotificationApi, Removed,
    SettingsApi, UpdateApi, WifiApi, WifiProfileChanges,
};
pub use listeners::{Listener, ListenerId, ListenerRegistry, Subscription};
pub use transport::{LocalTransport, Transport};
pub use ws_transport::WsTransport;

use crate::channel::{self, EventChannel, RequestChannel};
use crate::events::EventReceiver;
use crate::protocol::Failure;

use std::sync::Arc;
use std::time::Duration;

use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Default per-call deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Bridge<T: Transport> {
    transport: Arc<T>,
    listeners: ListenerRegistry,
    timeout: Duration,
    _pump: DropGuard,
}

impl<T: Transport> Bridge<T> {
    /// Wrap a transport and start delivering its events to listeners.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(transport: T) -> Self {
        let listeners = ListenerRegistry::new();
        let cancel = CancellationToken::new();

        tokio::spawn(pump_events(
            transport.events(),
            listeners.clone(),
            cancel.clone(),
        ));

        Self {
            transport: Arc::new(transport),
            listeners,
            timeout: DEFAULT_TIMEOUT,
            _pump: cancel.drop_guard(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Call a request channel by its runtime id.
    ///
    /// Ids that are not registered request channels fail with
    /// `UnknownChannel` without reaching the host; calls that outlive the
    /// deadline fail with `Timeout`.
    pub async fn invoke(&self, channel_id: &str, payload: Value) -> Result<Value, Failure> {
        if channel::request_channel(channel_id).is_none() {
            warn!("Bridge refused unknown channel {channel_id:?}");
            return Err(Failure::unknown_channel(channel_id));
        }

        match tokio::time::timeout(self.timeout, self.transport.invoke(channel_id, payload)).await {
            Ok(result) => result,
            Err(_) => Err(Failure::timeout(channel_id)),
        }
    }

    /// Typed call: serialize `request`, deserialize the result.
    pub async fn call<Req, Res>(&self, channel: RequestChannel, request: &Req) -> Result<Res, Failure>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let payload = serde_json::to_value(request)
            .map_err(|e| Failure::handler_fault(format!("Could not encode {channel} request: {e}")))?;

        let value = self.invoke(channel.as_str(), payload).await?;

        serde_json::from_value(value)
            .map_err(|e| Failure::handler_fault(format!("Unexpected {channel} result: {e}")))
    }

    /// Register a raw listener. Unknown ids yield an inert handle.
    pub fn subscribe<F>(&self, event_id: &str, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.listeners.subscribe(event_id, Arc::new(callback))
    }

    /// Register a listener that receives the payload decoded as `E`.
    /// Payloads that do not decode are logged and skipped.
    pub fn on<E, F>(&self, channel: EventChannel, callback: F) -> Subscription
    where
        E: DeserializeOwned,
        F: Fn(E) + Send + Sync + 'static,
    {
        self.subscribe(channel.as_str(), move |payload: &Value| {
            match E::deserialize(payload) {
                Ok(event) => callback(event),
                Err(e) => warn!("Undecodable {channel} payload: {e}"),
            }
        })
    }

    /// Remove one listener, or every listener for `event_id` when `listener`
    /// is `None`.
    pub fn unsubscribe(&self, event_id: &str, listener: Option<ListenerId>) -> usize {
        self.listeners.unsubscribe(event_id, listener)
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn auth(&self) -> AuthApi<'_, T> {
        AuthApi::new(self)
    }

    pub fn config(&self) -> ConfigApi<'_, T> {
        ConfigApi::new(self)
    }

    pub fn account(&self) -> AccountApi<'_, T> {
        AccountApi::new(self)
    }

    pub fn wifi(&self) -> WifiApi<'_, T> {
        WifiApi::new(self)
    }

    pub fn network(&self) -> NetworkApi<'_, T> {
        NetworkApi::new(self)
    }

    pub fn log(&self) -> LogApi<'_, T> {
        LogApi::new(self)
    }

    pub fn settings(&self) -> SettingsApi<'_, T> {
        SettingsApi::new(self)
    }

    pub fn app(&self) -> AppApi<'_, T> {
        AppApi::new(self)
    }

    pub fn auto_launch(&self) -> AutoLaunchApi<'_, T> {
        AutoLaunchApi::new(self)
    }

    pub fn notification(&self) -> NotificationApi<'_, T> {
        NotificationApi::new(self)
    }

    pub fn update(&self) -> UpdateApi<'_, T> {
        UpdateApi::new(self)
    }
}

async fn pump_events(
    mut events: EventReceiver,
    listeners: ListenerRegistry,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            received = events.recv() => match received {
                Some(frame) => {
                    listeners.deliver(&frame);
                }
                None => break,
            },
        }
    }
}

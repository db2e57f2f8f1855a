//! Request handlers, one module per capability namespace.
//!
//! Each module exposes `register`, which binds its channels on a
//! [`DispatcherBuilder`]. Handlers are plain `async fn(HostContext, Value)`;
//! [`route`] adapts them to the dispatcher's handler trait. Mutating routes
//! are registered exclusive on their [`Resource`](crate::dispatch::Resource).

mod account;
mod app;
mod auth;
mod auto_launch;
mod config;
mod logs;
mod network;
mod notification;
mod settings;
mod update;
mod wifi;

use crate::collaborators::{AuthService, AutoLaunchRegistrar, CredentialStore, Notifier};
use crate::dispatch::{DispatcherBuilder, HandlerResult, RequestHandler};
use crate::error::dispatch::DispatchError;
use crate::events::EventBus;
use crate::log_store::LogStore;
use crate::monitor::NetworkMonitor;
use crate::state::{AccountStore, ConfigState, SessionState, WifiStore};
use crate::update::UpdateController;

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Everything a handler may touch. Cheap to clone.
#[derive(Clone)]
pub struct HostContext {
    pub config: ConfigState,
    pub accounts: AccountStore,
    pub wifi: WifiStore,
    pub session: SessionState,
    pub monitor: NetworkMonitor,
    pub update: UpdateController,
    pub logs: LogStore,
    pub events: EventBus,
    pub credentials: Arc<dyn CredentialStore>,
    pub auth: Arc<dyn AuthService>,
    pub notifier: Arc<dyn Notifier>,
    pub auto_launch: Arc<dyn AutoLaunchRegistrar>,
    /// Cancelled by `app:quit`.
    pub shutdown: CancellationToken,
}

/// Bind every request channel to its handler.
pub fn register_all(builder: &mut DispatcherBuilder, ctx: &HostContext) -> Result<(), DispatchError> {
    auth::register(builder, ctx)?;
    config::register(builder, ctx)?;
    account::register(builder, ctx)?;
    wifi::register(builder, ctx)?;
    network::register(builder, ctx)?;
    logs::register(builder, ctx)?;
    settings::register(builder, ctx)?;
    app::register(builder, ctx)?;
    auto_launch::register(builder, ctx)?;
    notification::register(builder, ctx)?;
    update::register(builder, ctx)?;
    Ok(())
}

/// Adapt `async fn(HostContext, Value)` to a [`RequestHandler`].
fn route<F, Fut>(ctx: &HostContext, handler: F) -> impl RequestHandler
where
    F: Fn(HostContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    let ctx = ctx.clone();
    move |payload| handler(ctx.clone(), payload)
}

/// Distinguish an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates.
fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

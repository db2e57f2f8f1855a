use super::{HostContext, route};
use crate::channel::RequestChannel;
use crate::collaborators::Notification;
use crate::dispatch::{DispatcherBuilder, HandlerResult, Resource, parse_payload};
use crate::error::dispatch::DispatchError;
use crate::error::handler::HandlerError;

use log::debug;
use serde::Deserialize;
use serde_json::{Value, json};

pub(super) fn register(builder: &mut DispatcherBuilder, ctx: &HostContext) -> Result<(), DispatchError> {
    builder
        .register(RequestChannel::NotificationShow, route(ctx, show))?
        .register(RequestChannel::NotificationGetEnabled, route(ctx, get_enabled))?
        .register_exclusive(
            RequestChannel::NotificationSetEnabled,
            Resource::Settings,
            route(ctx, set_enabled),
        )?;
    Ok(())
}

#[derive(Deserialize)]
struct SetEnabled {
    enabled: bool,
}

async fn show(ctx: HostContext, payload: Value) -> HandlerResult {
    let notification: Notification = parse_payload(payload)?;
    if notification.title.trim().is_empty() {
        return Err(HandlerError::rejected("title cannot be empty"));
    }

    if !ctx.config.settings().await.notifications_enabled {
        debug!("Notifications disabled, dropping {:?}", notification.title);
        return Ok(json!({ "shown": false }));
    }

    ctx.notifier.show(&notification)?;
    Ok(json!({ "shown": true }))
}

async fn get_enabled(ctx: HostContext, _payload: Value) -> HandlerResult {
    Ok(json!({ "enabled": ctx.config.settings().await.notifications_enabled }))
}

async fn set_enabled(ctx: HostContext, payload: Value) -> HandlerResult {
    let SetEnabled { enabled } = parse_payload(payload)?;
    let settings = ctx.config.set_notifications_enabled(enabled).await?;
    Ok(json!({ "enabled": settings.notifications_enabled }))
}

use super::{HostContext, route};
use crate::channel::RequestChannel;
use crate::dispatch::{DispatcherBuilder, HandlerResult, Resource, parse_payload};
use crate::error::dispatch::DispatchError;

use serde::Deserialize;
use serde_json::{Value, json};

pub(super) fn register(builder: &mut DispatcherBuilder, ctx: &HostContext) -> Result<(), DispatchError> {
    builder
        .register(RequestChannel::AutoLaunchGet, route(ctx, get))?
        .register_exclusive(RequestChannel::AutoLaunchSet, Resource::Settings, route(ctx, set))?;
    Ok(())
}

#[derive(Deserialize)]
struct SetEnabled {
    enabled: bool,
}

async fn get(ctx: HostContext, _payload: Value) -> HandlerResult {
    Ok(json!({ "enabled": ctx.config.settings().await.auto_launch }))
}

/// Register with the OS first; the setting is only persisted if that worked.
async fn set(ctx: HostContext, payload: Value) -> HandlerResult {
    let SetEnabled { enabled } = parse_payload(payload)?;

    ctx.auto_launch.set_enabled(enabled)?;
    let settings = ctx.config.set_auto_launch(enabled).await?;

    Ok(json!({ "enabled": settings.auto_launch }))
}

use super::{HostContext, route};
use crate::channel::RequestChannel;
use crate::dispatch::{DispatcherBuilder, HandlerResult, Resource, to_payload};
use crate::error::dispatch::DispatchError;
use crate::error::handler::HandlerError;

use serde_json::Value;

const AUTO_LAUNCH_KEY: &str = "autoLaunch";

pub(super) fn register(builder: &mut DispatcherBuilder, ctx: &HostContext) -> Result<(), DispatchError> {
    builder
        .register(RequestChannel::SettingsGet, route(ctx, get))?
        .register_exclusive(RequestChannel::SettingsUpdate, Resource::Settings, route(ctx, update))?;
    Ok(())
}

async fn get(ctx: HostContext, _payload: Value) -> HandlerResult {
    to_payload(&ctx.config.settings().await)
}

/// Merge a partial settings object. A change to `autoLaunch` is also
/// applied to the OS registration.
async fn update(ctx: HostContext, payload: Value) -> HandlerResult {
    let Value::Object(patch) = payload else {
        return Err(HandlerError::invalid_payload("expected a settings object"));
    };

    let before = ctx.config.settings().await;
    let touches_auto_launch = patch.contains_key(AUTO_LAUNCH_KEY);

    let settings = ctx.config.update_settings(patch).await?;

    if touches_auto_launch && settings.auto_launch != before.auto_launch {
        ctx.auto_launch.set_enabled(settings.auto_launch)?;
    }

    to_payload(&settings)
}

use super::{HostContext, route};
use crate::channel::RequestChannel;
use crate::config::AppConfig;
use crate::dispatch::{DispatcherBuilder, HandlerResult, Resource, parse_payload, to_payload};
use crate::error::dispatch::DispatchError;

use serde_json::Value;

pub(super) fn register(builder: &mut DispatcherBuilder, ctx: &HostContext) -> Result<(), DispatchError> {
    builder
        .register(RequestChannel::ConfigGet, route(ctx, get))?
        .register_exclusive(RequestChannel::ConfigSet, Resource::Settings, route(ctx, set))?
        .register_exclusive(RequestChannel::ConfigReset, Resource::Settings, route(ctx, reset))?;
    Ok(())
}

async fn get(ctx: HostContext, _payload: Value) -> HandlerResult {
    to_payload(&ctx.config.get().await)
}

async fn set(ctx: HostContext, payload: Value) -> HandlerResult {
    let config: AppConfig = parse_payload(payload)?;
    to_payload(&ctx.config.replace(config).await?)
}

async fn reset(ctx: HostContext, _payload: Value) -> HandlerResult {
    to_payload(&ctx.config.reset().await?)
}

use super::{HostContext, route};
use crate::channel::RequestChannel;
use crate::dispatch::{DispatcherBuilder, HandlerResult, to_payload};
use crate::error::dispatch::DispatchError;

use serde_json::Value;

pub(super) fn register(builder: &mut DispatcherBuilder, ctx: &HostContext) -> Result<(), DispatchError> {
    builder
        .register(RequestChannel::NetworkStatus, route(ctx, status))?
        .register(RequestChannel::NetworkInfo, route(ctx, info))?
        .register(RequestChannel::NetworkCheck, route(ctx, check))?;
    Ok(())
}

async fn status(ctx: HostContext, _payload: Value) -> HandlerResult {
    to_payload(&ctx.monitor.latest())
}

async fn info(ctx: HostContext, _payload: Value) -> HandlerResult {
    to_payload(&ctx.monitor.info().await)
}

/// Observe now; broadcasts only if the status changed.
async fn check(ctx: HostContext, _payload: Value) -> HandlerResult {
    to_payload(&ctx.monitor.check_now().await)
}

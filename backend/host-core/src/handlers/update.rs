use super::{HostContext, route};
use crate::channel::RequestChannel;
use crate::dispatch::{DispatcherBuilder, HandlerResult, Resource, to_payload};
use crate::error::dispatch::DispatchError;

use serde_json::Value;

pub(super) fn register(builder: &mut DispatcherBuilder, ctx: &HostContext) -> Result<(), DispatchError> {
    builder
        .register_exclusive(RequestChannel::UpdateCheck, Resource::Update, route(ctx, check))?
        .register_exclusive(RequestChannel::UpdateDownload, Resource::Update, route(ctx, download))?
        .register_exclusive(RequestChannel::UpdateInstall, Resource::Update, route(ctx, install))?
        .register(RequestChannel::UpdateStatus, route(ctx, status))?;
    Ok(())
}

async fn check(ctx: HostContext, _payload: Value) -> HandlerResult {
    to_payload(&ctx.update.check().await?)
}

/// Returns as soon as the download has started.
async fn download(ctx: HostContext, _payload: Value) -> HandlerResult {
    to_payload(&ctx.update.download()?)
}

async fn install(ctx: HostContext, _payload: Value) -> HandlerResult {
    to_payload(&ctx.update.install().await?)
}

async fn status(ctx: HostContext, _payload: Value) -> HandlerResult {
    to_payload(&ctx.update.status())
}

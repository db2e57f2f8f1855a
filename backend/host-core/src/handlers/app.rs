use super::{HostContext, route};
use crate::APP_VERSION;
use crate::channel::RequestChannel;
use crate::dispatch::{DispatcherBuilder, HandlerResult};
use crate::error::dispatch::DispatchError;

use log::info;
use serde_json::{Value, json};

pub(super) fn register(builder: &mut DispatcherBuilder, ctx: &HostContext) -> Result<(), DispatchError> {
    builder
        .register(RequestChannel::AppVersion, route(ctx, version))?
        .register(RequestChannel::AppQuit, route(ctx, quit))?;
    Ok(())
}

async fn version(_ctx: HostContext, _payload: Value) -> HandlerResult {
    Ok(json!({ "version": APP_VERSION }))
}

async fn quit(ctx: HostContext, _payload: Value) -> HandlerResult {
    info!("Quit requested");
    ctx.shutdown.cancel();
    Ok(json!({ "quitting": true }))
}

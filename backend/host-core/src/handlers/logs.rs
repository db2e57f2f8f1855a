use super::{HostContext, route};
use crate::channel::RequestChannel;
use crate::dispatch::{DispatcherBuilder, HandlerResult, parse_payload, to_payload};
use crate::error::dispatch::DispatchError;
use crate::error::handler::HandlerError;
use crate::log_store::ExportFormat;

use serde::Deserialize;
use serde_json::{Value, json};

pub(super) fn register(builder: &mut DispatcherBuilder, ctx: &HostContext) -> Result<(), DispatchError> {
    builder
        .register(RequestChannel::LogGet, route(ctx, get))?
        .register(RequestChannel::LogClear, route(ctx, clear))?
        .register(RequestChannel::LogExport, route(ctx, export))?;
    Ok(())
}

#[derive(Deserialize)]
struct GetLogs {
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct ExportLogs {
    format: String,
}

async fn get(ctx: HostContext, payload: Value) -> HandlerResult {
    let GetLogs { limit } = parse_payload(payload)?;
    to_payload(&ctx.logs.entries(limit))
}

async fn clear(ctx: HostContext, _payload: Value) -> HandlerResult {
    Ok(json!({ "cleared": ctx.logs.clear() }))
}

async fn export(ctx: HostContext, payload: Value) -> HandlerResult {
    let ExportLogs { format } = parse_payload(payload)?;
    let format: ExportFormat = format.parse().map_err(HandlerError::rejected)?;

    Ok(json!({
        "format": format,
        "content": ctx.logs.export(format),
    }))
}

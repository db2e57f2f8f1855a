use super::{HostContext, deserialize_some, route};
use crate::channel::RequestChannel;
use crate::dispatch::{DispatcherBuilder, HandlerResult, Resource, parse_payload, to_payload};
use crate::error::dispatch::DispatchError;
use crate::error::handler::HandlerError;
use crate::state::WifiPatch;

use common::RedactedSecret;

use log::warn;
use serde::Deserialize;
use serde_json::{Value, json};

pub(super) fn register(builder: &mut DispatcherBuilder, ctx: &HostContext) -> Result<(), DispatchError> {
    builder
        .register(RequestChannel::WifiList, route(ctx, list))?
        .register_exclusive(RequestChannel::WifiAdd, Resource::WifiProfiles, route(ctx, add))?
        .register_exclusive(RequestChannel::WifiUpdate, Resource::WifiProfiles, route(ctx, update))?
        .register_exclusive(RequestChannel::WifiRemove, Resource::WifiProfiles, route(ctx, remove))?
        .register(RequestChannel::WifiCurrentSsid, route(ctx, current_ssid))?
        .register(RequestChannel::WifiFullInfo, route(ctx, full_info))?;
    Ok(())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddProfile {
    ssid: String,
    password: RedactedSecret,
    priority: Option<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfile {
    id: String,
    ssid: Option<String>,
    password: Option<RedactedSecret>,
    #[serde(default, deserialize_with = "deserialize_some")]
    priority: Option<Option<i32>>,
}

#[derive(Deserialize)]
struct ProfileId {
    id: String,
}

async fn list(ctx: HostContext, _payload: Value) -> HandlerResult {
    to_payload(&ctx.wifi.list().await)
}

async fn add(ctx: HostContext, payload: Value) -> HandlerResult {
    let request: AddProfile = parse_payload(payload)?;
    require_ssid(&request.ssid)?;

    let credential_ref = ctx.credentials.put(request.password)?;
    let profile = ctx
        .wifi
        .add(request.ssid, credential_ref, request.priority)
        .await;

    to_payload(&profile)
}

async fn update(ctx: HostContext, payload: Value) -> HandlerResult {
    let request: UpdateProfile = parse_payload(payload)?;
    if let Some(ref ssid) = request.ssid {
        require_ssid(ssid)?;
    }

    let existing = ctx
        .wifi
        .get(&request.id)
        .await
        .ok_or_else(|| HandlerError::not_found(format!("WiFi profile {} not found", request.id)))?;

    if let Some(password) = request.password {
        ctx.credentials.replace(&existing.credential_ref, password)?;
    }

    let patch = WifiPatch {
        ssid: request.ssid,
        priority: request.priority,
    };
    to_payload(&ctx.wifi.update(&request.id, patch).await?)
}

async fn remove(ctx: HostContext, payload: Value) -> HandlerResult {
    let ProfileId { id } = parse_payload(payload)?;
    let removed = ctx.wifi.remove(&id).await?;

    if let Err(e) = ctx.credentials.delete(&removed.credential_ref) {
        warn!("Failed to delete credentials for removed WiFi profile {id}: {e}");
    }

    Ok(json!({ "removed": id }))
}

async fn current_ssid(ctx: HostContext, _payload: Value) -> HandlerResult {
    let wifi = ctx.monitor.wifi_info().await?;
    to_payload(&wifi.map(|info| info.ssid))
}

async fn full_info(ctx: HostContext, _payload: Value) -> HandlerResult {
    to_payload(&ctx.monitor.wifi_info().await?)
}

#[track_caller]
fn require_ssid(ssid: &str) -> Result<(), HandlerError> {
    if ssid.trim().is_empty() {
        return Err(HandlerError::rejected("ssid cannot be empty"));
    }
    Ok(())
}

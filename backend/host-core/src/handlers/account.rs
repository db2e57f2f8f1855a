use super::{HostContext, route};
use crate::channel::RequestChannel;
use crate::dispatch::{DispatcherBuilder, HandlerResult, Resource, parse_payload, to_payload};
use crate::error::dispatch::DispatchError;
use crate::error::handler::HandlerError;
use crate::state::AccountPatch;

use common::RedactedSecret;

use log::warn;
use serde::Deserialize;
use serde_json::{Value, json};

pub(super) fn register(builder: &mut DispatcherBuilder, ctx: &HostContext) -> Result<(), DispatchError> {
    builder
        .register(RequestChannel::AccountList, route(ctx, list))?
        .register(RequestChannel::AccountGetCurrent, route(ctx, get_current))?
        .register_exclusive(RequestChannel::AccountAdd, Resource::Account, route(ctx, add))?
        .register_exclusive(RequestChannel::AccountUpdate, Resource::Account, route(ctx, update))?
        .register_exclusive(RequestChannel::AccountRemove, Resource::Account, route(ctx, remove))?
        .register_exclusive(RequestChannel::AccountSwitch, Resource::Account, route(ctx, switch))?;
    Ok(())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddAccount {
    label: String,
    username: String,
    password: RedactedSecret,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccount {
    id: String,
    label: Option<String>,
    username: Option<String>,
    password: Option<RedactedSecret>,
}

#[derive(Deserialize)]
struct AccountId {
    id: String,
}

async fn list(ctx: HostContext, _payload: Value) -> HandlerResult {
    to_payload(&ctx.accounts.list().await)
}

async fn get_current(ctx: HostContext, _payload: Value) -> HandlerResult {
    to_payload(&ctx.accounts.current().await)
}

async fn add(ctx: HostContext, payload: Value) -> HandlerResult {
    let request: AddAccount = parse_payload(payload)?;
    require_non_empty("label", &request.label)?;
    require_non_empty("username", &request.username)?;

    let credential_ref = ctx.credentials.put(request.password)?;
    let account = ctx
        .accounts
        .add(request.label, request.username, credential_ref)
        .await;

    to_payload(&account)
}

async fn update(ctx: HostContext, payload: Value) -> HandlerResult {
    let request: UpdateAccount = parse_payload(payload)?;
    if let Some(ref label) = request.label {
        require_non_empty("label", label)?;
    }
    if let Some(ref username) = request.username {
        require_non_empty("username", username)?;
    }

    let existing = ctx
        .accounts
        .get(&request.id)
        .await
        .ok_or_else(|| HandlerError::not_found(format!("Account {} not found", request.id)))?;

    if let Some(password) = request.password {
        ctx.credentials.replace(&existing.credential_ref, password)?;
    }

    let patch = AccountPatch {
        label: request.label,
        username: request.username,
    };
    to_payload(&ctx.accounts.update(&request.id, patch).await?)
}

async fn remove(ctx: HostContext, payload: Value) -> HandlerResult {
    let AccountId { id } = parse_payload(payload)?;
    let removed = ctx.accounts.remove(&id).await?;

    if let Err(e) = ctx.credentials.delete(&removed.credential_ref) {
        warn!("Failed to delete credentials for removed account {id}: {e}");
    }

    Ok(json!({ "removed": id }))
}

async fn switch(ctx: HostContext, payload: Value) -> HandlerResult {
    let AccountId { id } = parse_payload(payload)?;
    to_payload(&ctx.accounts.switch(&id).await?)
}

#[track_caller]
fn require_non_empty(field: &str, value: &str) -> Result<(), HandlerError> {
    if value.trim().is_empty() {
        return Err(HandlerError::rejected(format!("{field} cannot be empty")));
    }
    Ok(())
}

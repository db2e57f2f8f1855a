use super::{HostContext, route};
use crate::channel::{EventChannel, RequestChannel};
use crate::dispatch::{DispatcherBuilder, HandlerResult, Resource, to_payload};
use crate::error::dispatch::DispatchError;
use crate::error::handler::HandlerError;
use crate::model::SessionStatus;

use log::{info, warn};
use serde::Serialize;
use serde_json::Value;

pub(super) fn register(builder: &mut DispatcherBuilder, ctx: &HostContext) -> Result<(), DispatchError> {
    builder
        .register_exclusive(RequestChannel::AuthLogin, Resource::Session, route(ctx, login))?
        .register_exclusive(RequestChannel::AuthLogout, Resource::Session, route(ctx, logout))?;
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResult<'a> {
    token: &'a str,
    account_id: &'a str,
}

async fn login(ctx: HostContext, _payload: Value) -> HandlerResult {
    let account = ctx
        .accounts
        .current()
        .await
        .ok_or_else(|| HandlerError::not_found("No current account to log in with"))?;

    let password = ctx.credentials.get(&account.credential_ref)?;
    let token = ctx.auth.login(&account.username, &password).await?;

    ctx.session.set(token.clone(), account.id.clone()).await;
    info!("Logged in as account {}", account.id);

    ctx.events.emit(
        EventChannel::AuthStatusChanged,
        &SessionStatus {
            logged_in: true,
            account_id: Some(account.id.clone()),
        },
    );

    to_payload(&LoginResult {
        token: token.0.expose(),
        account_id: &account.id,
    })
}

/// Emits `event:auth:statusChanged` only when a session was actually ended.
async fn logout(ctx: HostContext, _payload: Value) -> HandlerResult {
    let status = SessionStatus::default();

    if let Some(token) = ctx.session.take().await {
        // The local session is gone either way; the portal will expire it.
        if let Err(e) = ctx.auth.logout(&token).await {
            warn!("Portal logout failed: {e}");
        }
        info!("Logged out");
        ctx.events.emit(EventChannel::AuthStatusChanged, &status);
    }

    to_payload(&status)
}

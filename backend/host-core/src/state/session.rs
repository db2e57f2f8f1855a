use crate::model::{SessionStatus, SessionToken};

use std::sync::Arc;

use tokio::sync::RwLock;

struct Session {
    token: SessionToken,
    account_id: String,
}

/// Portal session for the current account, if logged in.
#[derive(Clone, Default)]
pub struct SessionState {
    session: Arc<RwLock<Option<Session>>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn status(&self) -> SessionStatus {
        match &*self.session.read().await {
            Some(session) => SessionStatus {
                logged_in: true,
                account_id: Some(session.account_id.clone()),
            },
            None => SessionStatus::default(),
        }
    }

    pub async fn set(&self, token: SessionToken, account_id: String) {
        *self.session.write().await = Some(Session { token, account_id });
    }

    /// Clear the session, returning its token for logout.
    pub async fn take(&self) -> Option<SessionToken> {
        self.session.write().await.take().map(|s| s.token)
    }
}

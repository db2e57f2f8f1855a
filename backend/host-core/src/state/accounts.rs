use crate::config::persist;
use crate::error::config::ConfigError;
use crate::error::handler::HandlerError;
use crate::model::{Account, CredentialRef};

use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::RwLock;
use uuid::Uuid;

const ACCOUNTS_FILE_NAME: &str = "accounts.json";

/// Field changes for `account:update`.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub label: Option<String>,
    pub username: Option<String>,
}

/// Account list with the exactly-one-current invariant.
///
/// Once at least one account exists exactly one has `is_current = true`.
/// Every mutation builds the next list in full and swaps it in.
#[derive(Clone)]
pub struct AccountStore {
    accounts: Arc<RwLock<Arc<Vec<Account>>>>,
    data_dir: Option<Arc<PathBuf>>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(Arc::new(Vec::new()))),
            data_dir: None,
        }
    }

    /// Load `{data_dir}/accounts.json` (empty if missing) and persist every
    /// later mutation there.
    pub fn load(data_dir: PathBuf) -> Result<Self, ConfigError> {
        let mut accounts: Vec<Account> =
            persist::read_json(&data_dir, ACCOUNTS_FILE_NAME)?.unwrap_or_default();

        if normalize_current(&mut accounts) {
            warn!("Repaired current-account marker in {ACCOUNTS_FILE_NAME}");
        }
        info!("Loaded {} accounts", accounts.len());

        Ok(Self {
            accounts: Arc::new(RwLock::new(Arc::new(accounts))),
            data_dir: Some(Arc::new(data_dir)),
        })
    }

    pub async fn snapshot(&self) -> Arc<Vec<Account>> {
        Arc::clone(&*self.accounts.read().await)
    }

    pub async fn list(&self) -> Vec<Account> {
        self.snapshot().await.as_ref().clone()
    }

    pub async fn current(&self) -> Option<Account> {
        self.snapshot()
            .await
            .iter()
            .find(|account| account.is_current)
            .cloned()
    }

    pub async fn get(&self, id: &str) -> Option<Account> {
        self.snapshot().await.iter().find(|a| a.id == id).cloned()
    }

    /// Add an account. The first account becomes current.
    pub async fn add(&self, label: String, username: String, credential_ref: CredentialRef) -> Account {
        let mut guard = self.accounts.write().await;

        let account = Account {
            id: Uuid::new_v4().to_string(),
            label,
            username,
            credential_ref,
            is_current: guard.is_empty(),
        };

        let mut next = guard.as_ref().clone();
        next.push(account.clone());
        self.commit(&mut guard, next);

        info!("Added account {} ({})", account.id, account.label);
        account
    }

    pub async fn update(&self, id: &str, patch: AccountPatch) -> Result<Account, HandlerError> {
        let mut guard = self.accounts.write().await;

        let mut next = guard.as_ref().clone();
        let account = next
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| HandlerError::not_found(format!("Account {id} not found")))?;

        if let Some(label) = patch.label {
            account.label = label;
        }
        if let Some(username) = patch.username {
            account.username = username;
        }
        let updated = account.clone();

        self.commit(&mut guard, next);
        Ok(updated)
    }

    /// Remove an account, promoting the first remaining one if the current
    /// account was removed. Returns the removed account.
    pub async fn remove(&self, id: &str) -> Result<Account, HandlerError> {
        let mut guard = self.accounts.write().await;

        let mut next = guard.as_ref().clone();
        let index = next
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| HandlerError::not_found(format!("Account {id} not found")))?;
        let removed = next.remove(index);

        if removed.is_current
            && let Some(first) = next.first_mut()
        {
            first.is_current = true;
            info!("Promoted account {} to current", first.id);
        }

        self.commit(&mut guard, next);
        info!("Removed account {id}");
        Ok(removed)
    }

    /// Make `id` the current account in one swap.
    pub async fn switch(&self, id: &str) -> Result<Account, HandlerError> {
        let mut guard = self.accounts.write().await;

        if !guard.iter().any(|a| a.id == id) {
            return Err(HandlerError::not_found(format!("Account {id} not found")));
        }

        let next: Vec<Account> = guard
            .iter()
            .map(|a| Account {
                is_current: a.id == id,
                ..a.clone()
            })
            .collect();
        let current = next.iter().find(|a| a.is_current).cloned();

        self.commit(&mut guard, next);
        info!("Switched current account to {id}");

        current.ok_or_else(|| HandlerError::internal("Switched account vanished"))
    }

    fn commit(&self, guard: &mut Arc<Vec<Account>>, next: Vec<Account>) {
        *guard = Arc::new(next);

        if let Some(ref dir) = self.data_dir
            && let Err(e) = persist::write_json_atomic(dir, ACCOUNTS_FILE_NAME, guard.as_ref())
        {
            error!("Accounts updated in memory but disk write failed: {e}");
        }
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Enforce exactly one current account on a loaded list. Returns whether
/// anything changed.
fn normalize_current(accounts: &mut [Account]) -> bool {
    let mut seen_current = false;
    let mut changed = false;

    for account in accounts.iter_mut() {
        if account.is_current {
            if seen_current {
                account.is_current = false;
                changed = true;
            }
            seen_current = true;
        }
    }

    if !seen_current && let Some(first) = accounts.first_mut() {
        first.is_current = true;
        changed = true;
    }

    changed
}

// Unit tests for the account store.
// The exactly-one-current invariant must hold after every mutation.

use crate::error::HandlerError;
use crate::model::{Account, CredentialRef};
use crate::state::{AccountPatch, AccountStore};

use tempfile::TempDir;

fn current_count(accounts: &[Account]) -> usize {
    accounts.iter().filter(|a| a.is_current).count()
}

async fn add(store: &AccountStore, label: &str) -> Account {
    store
        .add(label.to_string(), format!("{label}-user"), CredentialRef::generate())
        .await
}

#[tokio::test]
async fn given_empty_store_when_first_account_added_then_it_becomes_current() {
    let store = AccountStore::new();

    let first = add(&store, "home").await;
    let second = add(&store, "work").await;

    assert!(first.is_current);
    assert!(!second.is_current);
    assert_eq!(store.current().await.unwrap().id, first.id);
}

/// **VALUE**: Switching flips both flags in one snapshot swap.
///
/// **BUG THIS CATCHES**: Would catch a two-step update (clear old, set new)
/// where a reader between the steps sees zero current accounts.
#[tokio::test]
async fn given_three_accounts_when_switching_then_exactly_one_current() {
    // GIVEN: Three accounts, the first current
    let store = AccountStore::new();
    add(&store, "a").await;
    let b = add(&store, "b").await;
    add(&store, "c").await;

    // WHEN: Switching to b
    let switched = store.switch(&b.id).await.unwrap();

    // THEN: b is the one and only current account
    let accounts = store.list().await;
    assert!(switched.is_current);
    assert_eq!(current_count(&accounts), 1);
    assert_eq!(store.current().await.unwrap().id, b.id);
}

#[tokio::test]
async fn given_unknown_id_when_switch_update_or_remove_then_not_found_and_unchanged() {
    let store = AccountStore::new();
    let a = add(&store, "a").await;

    let switch = store.switch("missing").await;
    let update = store.update("missing", AccountPatch::default()).await;
    let remove = store.remove("missing").await;

    assert!(matches!(switch, Err(HandlerError::NotFound { .. })));
    assert!(matches!(update, Err(HandlerError::NotFound { .. })));
    assert!(matches!(remove, Err(HandlerError::NotFound { .. })));
    assert_eq!(store.list().await, vec![a]);
}

/// **VALUE**: Removing the current account promotes the first remaining one.
///
/// **WHY THIS MATTERS**: `auth:login` always uses the current account; an
/// account list without one would make login fail with NotFound.
#[tokio::test]
async fn given_current_account_removed_when_others_remain_then_first_promoted() {
    // GIVEN: Current account c, with a and b before it
    let store = AccountStore::new();
    let a = add(&store, "a").await;
    add(&store, "b").await;
    let c = add(&store, "c").await;
    store.switch(&c.id).await.unwrap();

    // WHEN: Removing c
    let removed = store.remove(&c.id).await.unwrap();

    // THEN: a is promoted
    assert_eq!(removed.id, c.id);
    assert_eq!(store.current().await.unwrap().id, a.id);
    assert_eq!(current_count(&store.list().await), 1);
}

#[tokio::test]
async fn given_last_account_removed_when_listing_then_empty_with_no_current() {
    let store = AccountStore::new();
    let a = add(&store, "a").await;

    store.remove(&a.id).await.unwrap();

    assert!(store.list().await.is_empty());
    assert!(store.current().await.is_none());
}

#[tokio::test]
async fn given_patch_when_update_then_only_given_fields_change() {
    let store = AccountStore::new();
    let a = add(&store, "a").await;

    let updated = store
        .update(
            &a.id,
            AccountPatch {
                label: Some("renamed".into()),
                username: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.label, "renamed");
    assert_eq!(updated.username, a.username);
    assert_eq!(updated.is_current, a.is_current);
}

/// **VALUE**: A snapshot taken before a mutation is never altered by it.
#[tokio::test]
async fn given_snapshot_when_store_mutated_then_snapshot_unchanged() {
    let store = AccountStore::new();
    let a = add(&store, "a").await;
    let before = store.snapshot().await;

    add(&store, "b").await;
    store.remove(&a.id).await.unwrap();

    assert_eq!(before.len(), 1);
    assert_eq!(before[0].id, a.id);
}

/// **VALUE**: Accounts survive a restart and a hand-edited file is repaired.
///
/// **BUG THIS CATCHES**: Would catch a file with two current accounts being
/// loaded as-is and breaking the invariant from the first read.
#[tokio::test]
async fn given_persisted_accounts_when_reloaded_then_invariant_restored() {
    // GIVEN: A data dir with accounts written by a previous run
    let dir = TempDir::new().unwrap();
    let store = AccountStore::load(dir.path().to_path_buf()).unwrap();
    add(&store, "a").await;
    add(&store, "b").await;

    // AND: The file was edited so every account is current
    let path = dir.path().join("accounts.json");
    let mut raw: Vec<Account> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    raw.iter_mut().for_each(|a| a.is_current = true);
    std::fs::write(&path, serde_json::to_string(&raw).unwrap()).unwrap();

    // WHEN: Loading again
    let reloaded = AccountStore::load(dir.path().to_path_buf()).unwrap();

    // THEN: Both accounts are back with exactly one current
    let accounts = reloaded.list().await;
    assert_eq!(accounts.len(), 2);
    assert_eq!(current_count(&accounts), 1);
    assert!(accounts[0].is_current);
}

// Unit tests for the WiFi profile store.

use crate::error::HandlerError;
use crate::model::CredentialRef;
use crate::state::{WifiPatch, WifiStore};

#[tokio::test]
async fn given_mixed_priorities_when_listed_then_highest_first_and_unset_last() {
    let store = WifiStore::new();
    let none = store.add("cafe".into(), CredentialRef::generate(), None).await;
    let low = store.add("office".into(), CredentialRef::generate(), Some(1)).await;
    let high = store.add("home".into(), CredentialRef::generate(), Some(10)).await;
    let tie = store.add("home-5g".into(), CredentialRef::generate(), Some(1)).await;

    let ids: Vec<String> = store.list().await.into_iter().map(|p| p.id).collect();

    assert_eq!(ids, vec![high.id, low.id, tie.id, none.id]);
}

/// **VALUE**: Two profiles may share an SSID with different credentials.
#[tokio::test]
async fn given_same_ssid_twice_when_added_then_both_kept() {
    let store = WifiStore::new();

    let first = store.add("eduroam".into(), CredentialRef::generate(), None).await;
    let second = store.add("eduroam".into(), CredentialRef::generate(), None).await;

    assert_ne!(first.id, second.id);
    assert_eq!(store.list().await.len(), 2);
}

/// **VALUE**: `priority: null` clears the priority while an absent field keeps it.
///
/// **BUG THIS CATCHES**: Would catch the two cases collapsing into one, so a
/// rename silently wipes the priority.
#[tokio::test]
async fn given_priority_patch_when_update_then_absent_keeps_and_null_clears() {
    // GIVEN: A prioritized profile
    let store = WifiStore::new();
    let profile = store.add("home".into(), CredentialRef::generate(), Some(5)).await;

    // WHEN: Renaming without touching priority
    let renamed = store
        .update(
            &profile.id,
            WifiPatch {
                ssid: Some("home-2".into()),
                priority: None,
            },
        )
        .await
        .unwrap();

    // THEN: Priority is kept
    assert_eq!(renamed.priority, Some(5));

    // WHEN: Clearing priority explicitly
    let cleared = store
        .update(
            &profile.id,
            WifiPatch {
                ssid: None,
                priority: Some(None),
            },
        )
        .await
        .unwrap();

    // THEN: Priority is gone, name kept
    assert_eq!(cleared.priority, None);
    assert_eq!(cleared.ssid, "home-2");
}

#[tokio::test]
async fn given_unknown_id_when_removed_then_not_found() {
    let store = WifiStore::new();

    let result = store.remove("missing").await;

    assert!(matches!(result, Err(HandlerError::NotFound { .. })));
}

// Unit tests for config validation, persistence and the config actor.

use crate::config::{AppConfig, AppSettings, Theme};
use crate::error::ConfigError;
use crate::state::ConfigState;

use serde_json::{Map, Value, json};
use tempfile::TempDir;

fn patch(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("patch must be an object"),
    }
}

#[test]
fn given_missing_file_when_loading_then_defaults() {
    let dir = TempDir::new().unwrap();

    let config = AppConfig::load(dir.path()).unwrap();

    assert_eq!(config, AppConfig::default());
}

#[test]
fn given_saved_config_when_loaded_then_round_trips() {
    let dir = TempDir::new().unwrap();
    let mut config = AppConfig::default();
    config.settings.theme = Theme::Dark;
    config.update.feed_url = Some("https://updates.example.com/feed.json".into());

    config.save(dir.path()).unwrap();

    assert_eq!(AppConfig::load(dir.path()).unwrap(), config);
    assert!(!dir.path().join("config.json.tmp").exists());
}

/// **VALUE**: A corrupt file is an error, not a silent reset to defaults.
///
/// **WHY THIS MATTERS**: Silently resetting would overwrite the user's file
/// with defaults on the next save.
#[test]
fn given_corrupt_file_when_loading_then_parse_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();

    let result = AppConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

#[test]
fn given_invalid_values_when_validated_then_rejected() {
    let mut bad_interval = AppConfig::default();
    bad_interval.network.poll_interval_secs = 0;
    let mut bad_url = AppConfig::default();
    bad_url.auth.portal_url = Some("ftp://portal".into());
    let mut bad_language = AppConfig::default();
    bad_language.settings.language = "  ".into();

    for config in [bad_interval, bad_url, bad_language] {
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError { .. })));
    }
}

#[test]
fn given_partial_json_when_deserialized_then_missing_fields_defaulted() {
    let config: AppConfig = serde_json::from_value(json!({ "settings": { "theme": "dark" } })).unwrap();

    assert_eq!(config.settings.theme, Theme::Dark);
    assert!(config.settings.notifications_enabled);
    assert_eq!(config.ipc, AppConfig::default().ipc);
}

/// **VALUE**: A settings patch merges only the given keys and persists them.
#[tokio::test]
async fn given_settings_patch_when_applied_then_merged_and_saved() {
    // GIVEN: Config state backed by a temp dir
    let dir = TempDir::new().unwrap();
    let state = ConfigState::new(Some(dir.path().to_path_buf()), AppConfig::default());

    // WHEN: Patching two keys
    let settings = state
        .update_settings(patch(json!({ "theme": "light", "minimizeToTray": true })))
        .await
        .unwrap();

    // THEN: Those keys changed, the rest kept, and disk agrees
    assert_eq!(settings.theme, Theme::Light);
    assert!(settings.minimize_to_tray);
    assert_eq!(settings.language, AppSettings::default().language);
    assert_eq!(AppConfig::load(dir.path()).unwrap().settings, settings);
}

/// **VALUE**: Rejected patches leave both memory and disk untouched.
///
/// **BUG THIS CATCHES**: Would catch a merge that writes before validating,
/// or that ignores unknown keys so a typo looks like success.
#[tokio::test]
async fn given_bad_settings_patch_when_applied_then_rejected_and_unchanged() {
    let state = ConfigState::new(None, AppConfig::default());

    let unknown = state.update_settings(patch(json!({ "colour": "red" }))).await;
    let wrong_type = state.update_settings(patch(json!({ "autoLogin": "yes" }))).await;
    let empty_language = state.update_settings(patch(json!({ "language": "" }))).await;

    for result in [unknown, wrong_type, empty_language] {
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }
    assert_eq!(state.settings().await, AppSettings::default());
}

#[tokio::test]
async fn given_modified_config_when_reset_then_defaults_restored() {
    let state = ConfigState::new(None, AppConfig::default());
    state.set_notifications_enabled(false).await.unwrap();
    state.set_auto_launch(true).await.unwrap();

    let config = state.reset().await.unwrap();

    assert_eq!(config, AppConfig::default());
    assert_eq!(state.get().await, AppConfig::default());
}

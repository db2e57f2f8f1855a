use crate::config::persist;
use crate::error::config::ConfigError;
use crate::error::handler::HandlerError;
use crate::model::{CredentialRef, WifiProfile};

use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info};
use tokio::sync::RwLock;
use uuid::Uuid;

const WIFI_FILE_NAME: &str = "wifi.json";

/// Field changes for `wifi:update`. `priority: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct WifiPatch {
    pub ssid: Option<String>,
    pub priority: Option<Option<i32>>,
}

/// Saved WiFi profiles. Duplicate ssids are allowed.
#[derive(Clone)]
pub struct WifiStore {
    profiles: Arc<RwLock<Arc<Vec<WifiProfile>>>>,
    data_dir: Option<Arc<PathBuf>>,
}

impl WifiStore {
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(RwLock::new(Arc::new(Vec::new()))),
            data_dir: None,
        }
    }

    pub fn load(data_dir: PathBuf) -> Result<Self, ConfigError> {
        let profiles: Vec<WifiProfile> =
            persist::read_json(&data_dir, WIFI_FILE_NAME)?.unwrap_or_default();
        info!("Loaded {} WiFi profiles", profiles.len());

        Ok(Self {
            profiles: Arc::new(RwLock::new(Arc::new(profiles))),
            data_dir: Some(Arc::new(data_dir)),
        })
    }

    /// Profiles by descending priority; unset priority sorts last, ties keep
    /// insertion order.
    pub async fn list(&self) -> Vec<WifiProfile> {
        let mut profiles = self.profiles.read().await.as_ref().clone();
        profiles.sort_by_key(|p| std::cmp::Reverse(p.priority.map_or(i64::MIN, i64::from)));
        profiles
    }

    pub async fn get(&self, id: &str) -> Option<WifiProfile> {
        self.profiles.read().await.iter().find(|p| p.id == id).cloned()
    }

    pub async fn add(
        &self,
        ssid: String,
        credential_ref: CredentialRef,
        priority: Option<i32>,
    ) -> WifiProfile {
        let mut guard = self.profiles.write().await;

        let profile = WifiProfile {
            id: Uuid::new_v4().to_string(),
            ssid,
            credential_ref,
            priority,
        };

        let mut next = guard.as_ref().clone();
        next.push(profile.clone());
        self.commit(&mut guard, next);

        info!("Added WiFi profile {} ({})", profile.id, profile.ssid);
        profile
    }

    pub async fn update(&self, id: &str, patch: WifiPatch) -> Result<WifiProfile, HandlerError> {
        let mut guard = self.profiles.write().await;

        let mut next = guard.as_ref().clone();
        let profile = next
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| HandlerError::not_found(format!("WiFi profile {id} not found")))?;

        if let Some(ssid) = patch.ssid {
            profile.ssid = ssid;
        }
        if let Some(priority) = patch.priority {
            profile.priority = priority;
        }
        let updated = profile.clone();

        self.commit(&mut guard, next);
        Ok(updated)
    }

    pub async fn remove(&self, id: &str) -> Result<WifiProfile, HandlerError> {
        let mut guard = self.profiles.write().await;

        let mut next = guard.as_ref().clone();
        let index = next
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| HandlerError::not_found(format!("WiFi profile {id} not found")))?;
        let removed = next.remove(index);

        self.commit(&mut guard, next);
        info!("Removed WiFi profile {id}");
        Ok(removed)
    }

    fn commit(&self, guard: &mut Arc<Vec<WifiProfile>>, next: Vec<WifiProfile>) {
        *guard = Arc::new(next);

        if let Some(ref dir) = self.data_dir
            && let Err(e) = persist::write_json_atomic(dir, WIFI_FILE_NAME, guard.as_ref())
        {
            error!("WiFi profiles updated in memory but disk write failed: {e}");
        }
    }
}

impl Default for WifiStore {
    fn default() -> Self {
        Self::new()
    }
}

//! Capability namespaces of the Bridge.
//!
//! Each method is exactly one request-channel call.

use super::{Bridge, Transport};
use crate::channel::RequestChannel;
use crate::collaborators::Notification;
use crate::config::{AppConfig, AppSettings};
use crate::log_store::ExportFormat;
use crate::model::{
    Account, LogEntry, NetworkInfo, NetworkStatus, SessionStatus, UpdateState, WifiInfo, WifiProfile,
};
use crate::protocol::Failure;

use common::RedactedSecret;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub token: String,
    pub account_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Removed {
    pub removed: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Enabled {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogExport {
    pub format: ExportFormat,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount<'a> {
    pub label: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountChanges<'a> {
    pub id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWifiProfile<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

/// `priority: Some(None)` clears the priority.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiProfileChanges<'a> {
    pub id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Option<i32>>,
}

macro_rules! namespace {
    ($name:ident) => {
        pub struct $name<'a, T: Transport> {
            bridge: &'a Bridge<T>,
        }

        impl<'a, T: Transport> $name<'a, T> {
            pub(super) fn new(bridge: &'a Bridge<T>) -> Self {
                Self { bridge }
            }
        }
    };
}

namespace!(AuthApi);
namespace!(ConfigApi);
namespace!(AccountApi);
namespace!(WifiApi);
namespace!(NetworkApi);
namespace!(LogApi);
namespace!(SettingsApi);
namespace!(AppApi);
namespace!(AutoLaunchApi);
namespace!(NotificationApi);
namespace!(UpdateApi);

impl<T: Transport> AuthApi<'_, T> {
    pub async fn login(&self) -> Result<LoginResult, Failure> {
        self.bridge.call(RequestChannel::AuthLogin, &()).await
    }

    pub async fn logout(&self) -> Result<SessionStatus, Failure> {
        self.bridge.call(RequestChannel::AuthLogout, &()).await
    }
}

impl<T: Transport> ConfigApi<'_, T> {
    pub async fn get(&self) -> Result<AppConfig, Failure> {
        self.bridge.call(RequestChannel::ConfigGet, &()).await
    }

    pub async fn set(&self, config: &AppConfig) -> Result<AppConfig, Failure> {
        self.bridge.call(RequestChannel::ConfigSet, config).await
    }

    pub async fn reset(&self) -> Result<AppConfig, Failure> {
        self.bridge.call(RequestChannel::ConfigReset, &()).await
    }
}

impl<T: Transport> AccountApi<'_, T> {
    pub async fn list(&self) -> Result<Vec<Account>, Failure> {
        self.bridge.call(RequestChannel::AccountList, &()).await
    }

    pub async fn get_current(&self) -> Result<Option<Account>, Failure> {
        self.bridge.call(RequestChannel::AccountGetCurrent, &()).await
    }

    pub async fn add(&self, label: &str, username: &str, password: &RedactedSecret) -> Result<Account, Failure> {
        let request = NewAccount {
            label,
            username,
            password: password.expose(),
        };
        self.bridge.call(RequestChannel::AccountAdd, &request).await
    }

    pub async fn update(&self, changes: &AccountChanges<'_>) -> Result<Account, Failure> {
        self.bridge.call(RequestChannel::AccountUpdate, changes).await
    }

    pub async fn remove(&self, id: &str) -> Result<Removed, Failure> {
        self.bridge
            .call(RequestChannel::AccountRemove, &json!({ "id": id }))
            .await
    }

    pub async fn switch(&self, id: &str) -> Result<Account, Failure> {
        self.bridge
            .call(RequestChannel::AccountSwitch, &json!({ "id": id }))
            .await
    }
}

impl<T: Transport> WifiApi<'_, T> {
    pub async fn list(&self) -> Result<Vec<WifiProfile>, Failure> {
        self.bridge.call(RequestChannel::WifiList, &()).await
    }

    pub async fn add(&self, profile: &NewWifiProfile<'_>) -> Result<WifiProfile, Failure> {
        self.bridge.call(RequestChannel::WifiAdd, profile).await
    }

    pub async fn update(&self, changes: &WifiProfileChanges<'_>) -> Result<WifiProfile, Failure> {
        self.bridge.call(RequestChannel::WifiUpdate, changes).await
    }

    pub async fn remove(&self, id: &str) -> Result<Removed, Failure> {
        self.bridge
            .call(RequestChannel::WifiRemove, &json!({ "id": id }))
            .await
    }

    pub async fn current_ssid(&self) -> Result<Option<String>, Failure> {
        self.bridge.call(RequestChannel::WifiCurrentSsid, &()).await
    }

    pub async fn full_info(&self) -> Result<Option<WifiInfo>, Failure> {
        self.bridge.call(RequestChannel::WifiFullInfo, &()).await
    }
}

impl<T: Transport> NetworkApi<'_, T> {
    pub async fn status(&self) -> Result<NetworkStatus, Failure> {
        self.bridge.call(RequestChannel::NetworkStatus, &()).await
    }

    pub async fn info(&self) -> Result<NetworkInfo, Failure> {
        self.bridge.call(RequestChannel::NetworkInfo, &()).await
    }

    pub async fn check(&self) -> Result<NetworkStatus, Failure> {
        self.bridge.call(RequestChannel::NetworkCheck, &()).await
    }
}

impl<T: Transport> LogApi<'_, T> {
    pub async fn get(&self, limit: Option<usize>) -> Result<Vec<LogEntry>, Failure> {
        self.bridge
            .call(RequestChannel::LogGet, &json!({ "limit": limit }))
            .await
    }

    /// Returns how many entries were removed.
    pub async fn clear(&self) -> Result<usize, Failure> {
        #[derive(Deserialize)]
        struct Cleared {
            cleared: usize,
        }

        let cleared: Cleared = self.bridge.call(RequestChannel::LogClear, &()).await?;
        Ok(cleared.cleared)
    }

    /// `format` is `"text"` or `"json"`; anything else is rejected by the host.
    pub async fn export(&self, format: &str) -> Result<LogExport, Failure> {
        self.bridge
            .call(RequestChannel::LogExport, &json!({ "format": format }))
            .await
    }
}

impl<T: Transport> SettingsApi<'_, T> {
    pub async fn get(&self) -> Result<AppSettings, Failure> {
        self.bridge.call(RequestChannel::SettingsGet, &()).await
    }

    /// Merge `patch` (camelCase setting names) into the stored settings.
    pub async fn update(&self, patch: &Map<String, Value>) -> Result<AppSettings, Failure> {
        self.bridge.call(RequestChannel::SettingsUpdate, patch).await
    }
}

impl<T: Transport> AppApi<'_, T> {
    pub async fn version(&self) -> Result<String, Failure> {
        #[derive(Deserialize)]
        struct Version {
            version: String,
        }

        let version: Version = self.bridge.call(RequestChannel::AppVersion, &()).await?;
        Ok(version.version)
    }

    pub async fn quit(&self) -> Result<(), Failure> {
        let _: Value = self.bridge.call(RequestChannel::AppQuit, &()).await?;
        Ok(())
    }
}

impl<T: Transport> AutoLaunchApi<'_, T> {
    pub async fn get(&self) -> Result<bool, Failure> {
        let enabled: Enabled = self.bridge.call(RequestChannel::AutoLaunchGet, &()).await?;
        Ok(enabled.enabled)
    }

    pub async fn set(&self, enabled: bool) -> Result<bool, Failure> {
        let enabled: Enabled = self
            .bridge
            .call(RequestChannel::AutoLaunchSet, &json!({ "enabled": enabled }))
            .await?;
        Ok(enabled.enabled)
    }
}

impl<T: Transport> NotificationApi<'_, T> {
    /// Returns whether the notification was shown (false when disabled).
    pub async fn show(&self, notification: &Notification) -> Result<bool, Failure> {
        #[derive(Deserialize)]
        struct Shown {
            shown: bool,
        }

        let shown: Shown = self
            .bridge
            .call(RequestChannel::NotificationShow, notification)
            .await?;
        Ok(shown.shown)
    }

    pub async fn get_enabled(&self) -> Result<bool, Failure> {
        let enabled: Enabled = self
            .bridge
            .call(RequestChannel::NotificationGetEnabled, &())
            .await?;
        Ok(enabled.enabled)
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<bool, Failure> {
        let enabled: Enabled = self
            .bridge
            .call(RequestChannel::NotificationSetEnabled, &json!({ "enabled": enabled }))
            .await?;
        Ok(enabled.enabled)
    }
}

impl<T: Transport> UpdateApi<'_, T> {
    pub async fn check(&self) -> Result<UpdateState, Failure> {
        self.bridge.call(RequestChannel::UpdateCheck, &()).await
    }

    pub async fn download(&self) -> Result<UpdateState, Failure> {
        self.bridge.call(RequestChannel::UpdateDownload, &()).await
    }

    pub async fn install(&self) -> Result<UpdateState, Failure> {
        self.bridge.call(RequestChannel::UpdateInstall, &()).await
    }

    pub async fn status(&self) -> Result<UpdateState, Failure> {
        self.bridge.call(RequestChannel::UpdateStatus, &()).await
    }
}

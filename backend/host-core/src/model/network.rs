use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Connectivity {
    Online,
    Offline,
    #[default]
    Unknown,
}

/// One observation of the host's connectivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    pub connectivity: Connectivity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    /// 0..=100 when the platform reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_quality: Option<u8>,
    pub timestamp: u64,
}

impl NetworkStatus {
    pub fn unknown() -> Self {
        Self {
            connectivity: Connectivity::Unknown,
            ssid: None,
            signal_quality: None,
            timestamp: super::now_millis(),
        }
    }

    /// Equality on the fields that matter to listeners.
    ///
    /// Signal quality and timestamp drift on every poll and are ignored.
    pub fn same_state(&self, other: &NetworkStatus) -> bool {
        self.connectivity == other.connectivity && self.ssid == other.ssid
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiInfo {
    pub ssid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bssid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_quality: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_mhz: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub status: NetworkStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_ip: Option<String>,
}

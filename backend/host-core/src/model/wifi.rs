use crate::model::CredentialRef;

use serde::{Deserialize, Serialize};

/// A saved WiFi network.
///
/// `ssid` is deliberately not unique: several profiles may carry different
/// credentials for the same network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiProfile {
    pub id: String,
    pub ssid: String,
    pub credential_ref: CredentialRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

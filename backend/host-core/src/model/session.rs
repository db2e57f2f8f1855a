use common::RedactedSecret;

use serde::{Deserialize, Serialize};

/// Portal session token. Redacted in logs; sent to the UI only as the
/// `auth:login` result.
#[derive(Debug, Clone)]
pub struct SessionToken(pub RedactedSecret);

/// Payload of `event:auth:statusChanged`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub logged_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

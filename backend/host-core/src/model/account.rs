use std::fmt::{Display, Formatter, Result as FormatResult};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque handle into the credential store.
///
/// Accounts and WiFi profiles only ever hold this reference; the secret
/// itself stays with the [`CredentialStore`](crate::collaborators::CredentialStore).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialRef(pub String);

impl CredentialRef {
    pub fn generate() -> Self {
        CredentialRef(Uuid::new_v4().to_string())
    }
}

impl Display for CredentialRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub label: String,
    pub username: String,
    pub credential_ref: CredentialRef,
    pub is_current: bool,
}

use crate::error::CollaboratorError;
use crate::model::CredentialRef;

use common::RedactedSecret;

use std::collections::HashMap;
use std::sync::Mutex;

/// Secret storage backend (OS keychain in a packaged build).
pub trait CredentialStore: Send + Sync {
    fn put(&self, secret: RedactedSecret) -> Result<CredentialRef, CollaboratorError>;

    fn replace(
        &self,
        credential_ref: &CredentialRef,
        secret: RedactedSecret,
    ) -> Result<(), CollaboratorError>;

    fn get(&self, credential_ref: &CredentialRef) -> Result<RedactedSecret, CollaboratorError>;

    fn delete(&self, credential_ref: &CredentialRef) -> Result<(), CollaboratorError>;
}

/// Process-local store. Secrets are zeroized when removed or dropped.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    secrets: Mutex<HashMap<CredentialRef, RedactedSecret>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.secrets.lock().map(|s| s.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_secrets<T>(
        &self,
        f: impl FnOnce(&mut HashMap<CredentialRef, RedactedSecret>) -> Result<T, CollaboratorError>,
    ) -> Result<T, CollaboratorError> {
        let mut secrets = self
            .secrets
            .lock()
            .map_err(|_| CollaboratorError::credentials("credential store lock poisoned"))?;
        f(&mut secrets)
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn put(&self, secret: RedactedSecret) -> Result<CredentialRef, CollaboratorError> {
        let credential_ref = CredentialRef::generate();
        self.with_secrets(|secrets| {
            secrets.insert(credential_ref.clone(), secret);
            Ok(credential_ref)
        })
    }

    fn replace(
        &self,
        credential_ref: &CredentialRef,
        secret: RedactedSecret,
    ) -> Result<(), CollaboratorError> {
        self.with_secrets(|secrets| {
            secrets.insert(credential_ref.clone(), secret);
            Ok(())
        })
    }

    fn get(&self, credential_ref: &CredentialRef) -> Result<RedactedSecret, CollaboratorError> {
        self.with_secrets(|secrets| {
            secrets.get(credential_ref).cloned().ok_or_else(|| {
                CollaboratorError::credentials(format!("No secret stored for {credential_ref}"))
            })
        })
    }

    fn delete(&self, credential_ref: &CredentialRef) -> Result<(), CollaboratorError> {
        self.with_secrets(|secrets| {
            secrets.remove(credential_ref);
            Ok(())
        })
    }
}

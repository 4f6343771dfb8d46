use std::collections::HashMap;

use parking_lot::Mutex;
use weathernow_core::PersistenceError;

/// Keyring account / map key the session token lives under
pub const TOKEN_KEY: &str = "userToken";

/// Secure storage for the backend session token.
///
/// Kept apart from the general key-value store so the token never lands next
/// to plain location data. Values are stored JSON-encoded.
pub trait SecretStore: Send + Sync {
    /// Store the token, replacing any previous one
    fn store_token(&self, token: &str) -> Result<(), PersistenceError>;

    /// `Ok(None)` when no token has been stored
    fn retrieve_token(&self) -> Result<Option<String>, PersistenceError>;

    /// Delete the token. Deleting a missing token is not an error.
    fn delete_token(&self) -> Result<(), PersistenceError>;

    fn has_token(&self) -> bool {
        matches!(self.retrieve_token(), Ok(Some(_)))
    }
}

fn encode_token(token: &str) -> Result<String, PersistenceError> {
    serde_json::to_string(token)
        .map_err(|e| PersistenceError::Secret(format!("Failed to encode token: {}", e)))
}

fn decode_token(raw: &str) -> Result<String, PersistenceError> {
    serde_json::from_str(raw)
        .map_err(|e| PersistenceError::Secret(format!("Failed to decode token: {}", e)))
}

/// Token storage backed by the OS keyring
pub struct KeyringSecretStore {
    service: String,
}

impl KeyringSecretStore {
    /// # Arguments
    /// * `service` - Keyring service name (e.g., "weathernow")
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, PersistenceError> {
        keyring::Entry::new(&self.service, TOKEN_KEY)
            .map_err(|e| PersistenceError::Secret(e.to_string()))
    }
}

impl SecretStore for KeyringSecretStore {
    fn store_token(&self, token: &str) -> Result<(), PersistenceError> {
        let encoded = encode_token(token)?;
        self.entry()?
            .set_password(&encoded)
            .map_err(|e| PersistenceError::Secret(e.to_string()))?;

        tracing::info!("Stored session token in keyring service: {}", self.service);
        Ok(())
    }

    fn retrieve_token(&self) -> Result<Option<String>, PersistenceError> {
        match self.entry()?.get_password() {
            Ok(raw) => decode_token(&raw).map(Some),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(PersistenceError::Secret(e.to_string())),
        }
    }

    fn delete_token(&self) -> Result<(), PersistenceError> {
        match self.entry()?.delete_password() {
            Ok(()) => {
                tracing::info!("Deleted session token from keyring service: {}", self.service);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(PersistenceError::Secret(e.to_string())),
        }
    }
}

/// Process-local token storage.
///
/// For tests and hosts without a usable keyring; nothing survives a restart.
#[derive(Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored value exactly as persisted (JSON-encoded)
    pub fn raw_token(&self) -> Option<String> {
        self.entries.lock().get(TOKEN_KEY).cloned()
    }
}

impl SecretStore for MemorySecretStore {
    fn store_token(&self, token: &str) -> Result<(), PersistenceError> {
        let encoded = encode_token(token)?;
        self.entries.lock().insert(TOKEN_KEY.to_string(), encoded);
        Ok(())
    }

    fn retrieve_token(&self) -> Result<Option<String>, PersistenceError> {
        self.entries
            .lock()
            .get(TOKEN_KEY)
            .map(|raw| decode_token(raw))
            .transpose()
    }

    fn delete_token(&self) -> Result<(), PersistenceError> {
        self.entries.lock().remove(TOKEN_KEY);
        Ok(())
    }
}

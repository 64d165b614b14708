use keyring::Entry;
use tracing::debug;

use super::{SecureStore, StoreError};

/// Default keychain service name for stored sessions
pub const DEFAULT_SERVICE_NAME: &str = "authkeep";

/// Secure store backed by the OS keychain (macOS Keychain, Windows
/// Credential Manager, the kernel keyutils session keyring on Linux).
///
/// Each key becomes one keychain item under the configured service.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
    target: Option<String>,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            target: None,
        }
    }

    /// Store items in a specific keychain / collection (access group on Apple
    /// platforms) instead of the platform default.
    pub fn with_target(service: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            target: Some(target.into()),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        let entry = match self.target {
            Some(ref target) => Entry::new_with_target(target, &self.service, key)?,
            None => Entry::new(&self.service, key)?,
        };
        Ok(entry)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

impl SecureStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self.entry(key)?.get_secret() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entry(key)?.set_secret(value)?;
        debug!(service = %self.service, key, bytes = value.len(), "Stored keychain item");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

use std::collections::HashMap;
use std::sync::RwLock;

use super::{SecureStore, StoreError};

/// Process-local store. Nothing survives a restart, so this is meant for
/// tests and clients that deliberately opt out of persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecureStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::Corrupt("memory store lock poisoned".to_string()))?;
        Ok(items.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut items = self
            .items
            .write()
            .map_err(|_| StoreError::Corrupt("memory store lock poisoned".to_string()))?;
        items.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut items = self
            .items
            .write()
            .map_err(|_| StoreError::Corrupt("memory store lock poisoned".to_string()))?;
        items.remove(key);
        Ok(())
    }
}

use std::collections::HashMap;

use super::{KeyStore, StoreError};
use crate::key::{EcdhKey, Key, KeyState};

/// In-memory key store.
///
/// `HashMap` keyed by store identity, plus an index from correlation token to
/// the identity of the pending ECDH key for that token. All operations are
/// O(1) except `keys`, which is O(n). Never fails.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    keys: HashMap<String, Key>,

    /// Correlation token -> id of the pending ECDH key
    pending: HashMap<String, String>,
}

impl MemoryKeyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn unindex(&mut self, key: &Key) {
        if let Key::Ecdh(ecdh) = key {
            let token = ecdh.session_id.random();
            if self.pending.get(token).is_some_and(|id| *id == key.id()) {
                self.pending.remove(token);
            }
        }
    }
}

impl KeyStore for MemoryKeyStore {
    fn add(&mut self, key: Key) -> Result<(), StoreError> {
        let id = key.id();
        if let Some(previous) = self.keys.remove(&id) {
            self.unindex(&previous);
        }

        if let Key::Ecdh(ecdh @ EcdhKey { state: KeyState::Pending, .. }) = &key {
            let token = ecdh.session_id.random().to_owned();
            if let Some(displaced) = self.pending.insert(token, id.clone()) {
                self.keys.remove(&displaced);
            }
        }

        self.keys.insert(id, key);
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<Option<Key>, StoreError> {
        let removed = self.keys.remove(id);
        if let Some(key) = &removed {
            self.unindex(key);
        }
        Ok(removed)
    }

    fn lookup_ecdh_key(&self, token: &str) -> Result<Option<EcdhKey>, StoreError> {
        let key = self.pending.get(token).and_then(|id| self.keys.get(id));
        Ok(match key {
            Some(Key::Ecdh(ecdh)) if ecdh.state == KeyState::Pending => Some(ecdh.clone()),
            _ => None,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Key>, StoreError> {
        Ok(self.keys.get(id).cloned())
    }

    fn keys(&self) -> Result<Vec<Key>, StoreError> {
        Ok(self.keys.values().cloned().collect())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.keys.len())
    }
}

//! Key store abstraction
//!
//! The store is the single sink for every key the handshake produces. It is
//! single-writer: the orchestrator owns it and is its only mutator, so every
//! mutating method takes `&mut self` and no internal locking is needed.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryKeyStore;

use crate::key::{EcdhKey, Key};

/// Storage for session, ECDH and imported keys, keyed by [`Key::id`].
pub trait KeyStore {
    /// Insert or overwrite a key.
    ///
    /// # Invariants
    ///
    /// - Idempotent: adding an identical key twice leaves one entry
    /// - At most one pending ECDH key per correlation token; adding a pending
    ///   ECDH key replaces any other pending key with the same token
    fn add(&mut self, key: Key) -> Result<(), StoreError>;

    /// Remove a key by identity. Returns the removed key, if any.
    fn remove(&mut self, id: &str) -> Result<Option<Key>, StoreError>;

    /// Pending ECDH key for a correlation token.
    ///
    /// Returns `None` if no request with this token is outstanding.
    fn lookup_ecdh_key(&self, token: &str) -> Result<Option<EcdhKey>, StoreError>;

    /// Key by identity.
    fn get(&self, id: &str) -> Result<Option<Key>, StoreError>;

    /// All keys, in unspecified order.
    fn keys(&self) -> Result<Vec<Key>, StoreError>;

    /// Number of stored keys.
    fn len(&self) -> Result<usize, StoreError>;

    /// True if no key is stored.
    fn is_empty(&self) -> Result<bool, StoreError> {
        self.len().map(|n| n == 0)
    }
}

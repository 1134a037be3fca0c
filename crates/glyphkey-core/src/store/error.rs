//! Key store error types.

use thiserror::Error;

/// Opaque collaborator failure from a key store backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend could not complete the operation
    #[error("key store unavailable: {reason}")]
    Unavailable {
        /// Backend-specific description
        reason: String,
    },
}

//! Error types for the Glyphkey core.
//!
//! The taxonomy follows how callers recover:
//!
//! - [`FormatError`]: input is malformed or not yet complete. Recovered
//!   locally, surfaces as "not yet valid", never fatal.
//! - [`HandshakeError::UnknownSession`]: a response without a matching
//!   pending request. Reported per item, never retried.
//! - [`StoreError`](crate::store::StoreError): opaque collaborator failure,
//!   passed through.
//!
//! No key is ever derived from or stored using data that produced one of
//! these errors.

use glyphkey_codec::CodecError;
use glyphkey_crypto::CryptoError;
use thiserror::Error;

use crate::{key::KeyState, session_id::SessionId, store::StoreError};

/// Malformed or incomplete input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Session type discriminator is not one of the known symbols
    #[error("unknown session type symbol {symbol:?}")]
    UnknownSessionType {
        /// Offending symbol
        symbol: char,
    },

    /// Symbol decoding or checksum failure
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Illegal key lifecycle transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot {operation} a key in state {state:?}")]
pub struct StateError {
    /// Current key state
    pub state: KeyState,
    /// Operation that was attempted
    pub operation: &'static str,
}

/// Errors from processing a key pair or managing stored keys.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// Session ID or key material is malformed
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// ECDH response with no pending request for its correlation token
    #[error("unknown session {session_id}: no pending request")]
    UnknownSession {
        /// Session ID of the orphaned response
        session_id: SessionId,
    },

    /// Peer contribution rejected by the key agreement
    #[error("key agreement failed: {0}")]
    Crypto(#[from] CryptoError),

    /// Key store failure
    #[error("key store error: {0}")]
    Store(#[from] StoreError),

    /// No stored key with this identity
    #[error("key not found: {id}")]
    KeyNotFound {
        /// Store identity that was looked up
        id: String,
    },

    /// Key lifecycle transition not allowed
    #[error(transparent)]
    State(#[from] StateError),

    /// Every generated correlation token collided with a pending request or
    /// a stored session key
    #[error("no free correlation token after {attempts} attempts")]
    TokenExhausted {
        /// Attempts made
        attempts: usize,
    },
}

/// Errors from driving a [`ManualEntry`](crate::manual::ManualEntry).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManualEntryError {
    /// Key blocks edited before the selector block names a session
    #[error("selector block does not name a session yet")]
    NoSession,

    /// Block index or content rejected by the block group
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors from parsing an encrypted file header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileHeaderError {
    /// Fewer bytes than a full header
    #[error("header too short: expected {expected} bytes, got {actual}")]
    TooShort {
        /// Header size
        expected: usize,
        /// Bytes available
        actual: usize,
    },

    /// Key id bytes are not printable ASCII symbols
    #[error("invalid key id")]
    InvalidKeyId,
}

impl HandshakeError {
    /// Returns true if the error was caused by bad input from a scan or a
    /// transcription. These are expected and never fatal.
    pub fn is_format_error(&self) -> bool {
        match self {
            Self::Format(_) => true,
            Self::Crypto(err) => err.is_peer_error(),
            Self::UnknownSession { .. }
            | Self::Store(_)
            | Self::KeyNotFound { .. }
            | Self::State(_)
            | Self::TokenExhausted { .. } => false,
        }
    }

    /// Returns true if processing further input is pointless.
    ///
    /// Only store failures are fatal: the key store is the single sink for
    /// every successful handshake.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

impl From<CodecError> for HandshakeError {
    fn from(err: CodecError) -> Self {
        Self::Format(FormatError::Codec(err))
    }
}

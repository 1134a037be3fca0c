//! Glyphkey Core
//!
//! Session identifiers, key lifecycle, QR payload classification and the ECDH
//! handshake orchestrator. Synchronous and I/O free: randomness and time come
//! from an [`Environment`], persistence from a [`KeyStore`].
//!
//! # Flow
//!
//! ```text
//! scanned text ──▶ classify_payload ──▶ StandardBatch ─┐
//!                                                      ├─▶ Handshake ──▶ KeyStore
//! typed blocks ──▶ ManualEntry ──▶ (SessionId, key) ───┘        │
//!                                                               ▼
//!                                               generated responses for display
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod error;
pub mod file_header;
pub mod handshake;
pub mod key;
pub mod manual;
pub mod payload;
pub mod session_id;
pub mod store;

pub use env::Environment;
pub use error::{FileHeaderError, FormatError, HandshakeError, ManualEntryError, StateError};
pub use file_header::{EncryptedFileHeader, encrypted_path, is_encrypted_path};
pub use glyphkey_crypto::EcdhWidth;
pub use handshake::{
    BatchReport, DEFAULT_REMOTE_PARTNER, GeneratedCode, Handshake, KeyPairOutcome, StoredKey,
};
pub use key::{EcdhKey, Key, KeyMaterial, KeyState, PrivaSphereKey, SessionKey};
pub use manual::ManualEntry;
pub use payload::{
    KeyPair, Payload, PayloadError, PrivaSphereRecord, StandardBatch, classify_payload,
    format_standard, is_standard_key, standard_keys,
};
pub use session_id::{Role, SessionId, SessionType};
pub use store::{KeyStore, MemoryKeyStore, StoreError};

//! Glyphkey Cryptographic Primitives
//!
//! Thin layer over X25519 and HKDF-SHA256. Pure functions with deterministic
//! outputs: callers provide random bytes, so handshakes replay exactly in
//! tests.
//!
//! # Handshake
//!
//! ```text
//! initiator                          responder
//!    │ EphemeralKey (request)           │
//!    │──── request contribution ───────▶│ EphemeralKey (response)
//!    │                                  │ DH → HKDF → session key
//!    │◀─── response contribution ───────│
//!    │ DH → HKDF → session key          │
//! ```
//!
//! A contribution is a width tag followed by one (256) or two (512) X25519
//! public keys. Both sides feed the same shared secrets, correlation token and
//! both contributions into HKDF, so the derived key is bound to the exact
//! request/response pair.
//!
//! # Security
//!
//! - Ephemeral secrets are zeroized on drop
//! - Low-order peer points are rejected (non-contributory exchange)
//! - Derived keys are returned in [`zeroize::Zeroizing`] buffers

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod derivation;
pub mod ecdh;
mod error;

pub use derivation::derive_session_key;
pub use ecdh::{EcdhWidth, EphemeralKey, SharedSecret};
pub use error::CryptoError;

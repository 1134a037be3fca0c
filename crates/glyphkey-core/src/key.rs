//! Key domain types and their lifecycle.
//!
//! # State Machine
//!
//! ```text
//! ┌─────────┐                   ┌────────┐
//! │ Pending │                   │ Remote │
//! └────┬────┘                   └───┬────┘
//!      │ response processed         │ confirm()
//!      ▼                            ▼
//! ┌────────────────────────────────────┐  begin_reading()  ┌─────────┐
//! │               Usable               │ ────────────────▶ │ Reading │
//! │                                    │ ◀──────────────── │         │
//! └────────────────────────────────────┘   end_reading()   └─────────┘
//! ```
//!
//! Pending belongs to our own outstanding ECDH requests. Remote marks key
//! material that arrived from a peer and has not been confirmed by the user.

use std::fmt;

use glyphkey_crypto::{EcdhWidth, EphemeralKey};
use zeroize::Zeroizing;

use crate::{
    env::Environment,
    error::{HandshakeError, StateError},
    session_id::SessionId,
};

/// Lifecycle state of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyState {
    /// Request issued, awaiting response
    Pending,
    /// Received from a peer, unconfirmed
    Remote,
    /// Handshake complete
    Usable,
    /// In active use for reading a file
    Reading,
}

/// Secret key bytes. Zeroized on drop, redacted in `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial(Zeroizing<Vec<u8>>);

impl KeyMaterial {
    /// Wrap key bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for zero-length material.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Zeroizing<Vec<u8>>> for KeyMaterial {
    fn from(bytes: Zeroizing<Vec<u8>>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial({} bytes, [REDACTED])", self.0.len())
    }
}

/// Symmetric session key, from transcription or ECDH derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey {
    /// Session identity (a session key type)
    pub session_id: SessionId,
    /// Partner label
    pub partner: String,
    /// Lifecycle state
    pub state: KeyState,
    /// Key bytes
    pub key: KeyMaterial,
    /// Creation time, seconds since the Unix epoch
    pub created_at: u64,
}

impl SessionKey {
    /// Remote key becomes usable after user confirmation.
    pub fn confirm(&mut self) -> Result<(), StateError> {
        self.transition(&[KeyState::Remote], KeyState::Usable, "confirm")
    }

    /// Mark the key as in use for reading.
    pub fn begin_reading(&mut self) -> Result<(), StateError> {
        self.transition(&[KeyState::Usable], KeyState::Reading, "begin reading")
    }

    /// Return a reading key to usable.
    pub fn end_reading(&mut self) -> Result<(), StateError> {
        self.transition(&[KeyState::Reading], KeyState::Usable, "end reading")
    }

    fn transition(
        &mut self,
        from: &[KeyState],
        to: KeyState,
        operation: &'static str,
    ) -> Result<(), StateError> {
        if !from.contains(&self.state) {
            return Err(StateError { state: self.state, operation });
        }
        self.state = to;
        Ok(())
    }
}

/// One side of an ECDH handshake: session identity plus ephemeral secret.
#[derive(Debug, Clone)]
pub struct EcdhKey {
    /// Session identity (an ECDH type)
    pub session_id: SessionId,
    /// Ephemeral secret and public contribution
    pub ephemeral: EphemeralKey,
    /// Partner label
    pub partner: String,
    /// Lifecycle state
    pub state: KeyState,
}

impl EcdhKey {
    /// Outstanding request of our own. Stored as [`KeyState::Pending`] until
    /// the response arrives.
    pub fn initiate<E: Environment>(
        session_id: SessionId,
        width: EcdhWidth,
        partner: impl Into<String>,
        env: &E,
    ) -> Result<Self, HandshakeError> {
        Ok(Self {
            session_id,
            ephemeral: fresh_ephemeral(width, env)?,
            partner: partner.into(),
            state: KeyState::Pending,
        })
    }

    /// Transient responder side for a peer's request. Never stored.
    pub fn respond<E: Environment>(
        session_id: SessionId,
        width: EcdhWidth,
        partner: impl Into<String>,
        env: &E,
    ) -> Result<Self, HandshakeError> {
        Ok(Self {
            session_id,
            ephemeral: fresh_ephemeral(width, env)?,
            partner: partner.into(),
            state: KeyState::Remote,
        })
    }

    /// Public contribution to transmit.
    pub fn contribution(&self) -> &[u8] {
        self.ephemeral.contribution()
    }
}

fn fresh_ephemeral<E: Environment>(
    width: EcdhWidth,
    env: &E,
) -> Result<EphemeralKey, HandshakeError> {
    let mut seed = Zeroizing::new(vec![0u8; width.seed_len()]);
    env.random_bytes(&mut seed);
    Ok(EphemeralKey::from_seed(width, &seed)?)
}

/// Key imported out of band from a PrivaSphere record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivaSphereKey {
    /// Record identity
    pub id: String,
    /// Partner label
    pub partner: String,
    /// Creation date as carried by the record
    pub creation_date: String,
    /// Last use, seconds since the Unix epoch
    pub last_use_date: Option<u64>,
    /// Last activity, seconds since the Unix epoch
    pub last_activity: Option<u64>,
    /// Key bytes
    pub key: KeyMaterial,
}

impl PrivaSphereKey {
    /// Record a use of the key at `now`.
    pub fn touch(&mut self, now: u64) {
        self.last_use_date = Some(now);
        self.last_activity = Some(now);
    }
}

/// Any key the store can hold.
#[derive(Debug, Clone)]
pub enum Key {
    /// Symmetric session key
    Session(SessionKey),
    /// Pending ECDH request
    Ecdh(EcdhKey),
    /// Out-of-band imported key
    PrivaSphere(PrivaSphereKey),
}

impl Key {
    /// Store identity: session ID text, or the PrivaSphere record id.
    pub fn id(&self) -> String {
        match self {
            Self::Session(key) => key.session_id.to_text(),
            Self::Ecdh(key) => key.session_id.to_text(),
            Self::PrivaSphere(key) => key.id.clone(),
        }
    }

    /// Partner label.
    pub fn partner(&self) -> &str {
        match self {
            Self::Session(key) => &key.partner,
            Self::Ecdh(key) => &key.partner,
            Self::PrivaSphere(key) => &key.partner,
        }
    }

    /// Lifecycle state. Imported keys are always usable.
    pub fn state(&self) -> KeyState {
        match self {
            Self::Session(key) => key.state,
            Self::Ecdh(key) => key.state,
            Self::PrivaSphere(_) => KeyState::Usable,
        }
    }

    /// Session ID, if the key has one.
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::Session(key) => Some(&key.session_id),
            Self::Ecdh(key) => Some(&key.session_id),
            Self::PrivaSphere(_) => None,
        }
    }
}

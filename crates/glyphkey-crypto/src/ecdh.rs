//! Ephemeral X25519 contributions.
//!
//! A contribution is `tag || public_key+`: one X25519 public key for the 256
//! width, two independent ones for the 512 width. The secret half never
//! leaves [`EphemeralKey`].

use std::fmt;

use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Size of one X25519 public key or secret scalar.
pub const X25519_LEN: usize = 32;

/// Handshake width. Selects contribution size and derived key length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcdhWidth {
    /// One X25519 exchange, derives a 128-bit session key
    W256,
    /// Two X25519 exchanges, derives a 256-bit session key
    W512,
}

impl EcdhWidth {
    /// Leading tag byte of a contribution.
    pub const fn tag(self) -> u8 {
        match self {
            Self::W256 => 0x01,
            Self::W512 => 0x02,
        }
    }

    /// Number of X25519 exchanges.
    pub const fn components(self) -> usize {
        match self {
            Self::W256 => 1,
            Self::W512 => 2,
        }
    }

    /// Random bytes needed to create an [`EphemeralKey`].
    pub const fn seed_len(self) -> usize {
        self.components() * X25519_LEN
    }

    /// Contribution size in bytes, tag included.
    pub const fn contribution_len(self) -> usize {
        1 + self.components() * X25519_LEN
    }

    /// Length of the session key derived from this width.
    pub const fn session_key_len(self) -> usize {
        match self {
            Self::W256 => 16,
            Self::W512 => 32,
        }
    }
}

/// Ephemeral secret scalars plus their public contribution.
///
/// Secrets are zeroized on drop; `Debug` shows only the public part.
#[derive(Clone)]
pub struct EphemeralKey {
    width: EcdhWidth,
    secrets: Vec<StaticSecret>,
    contribution: Vec<u8>,
}

impl EphemeralKey {
    /// Create an ephemeral key from caller-provided random bytes.
    ///
    /// `seed` must be exactly [`EcdhWidth::seed_len`] bytes.
    pub fn from_seed(width: EcdhWidth, seed: &[u8]) -> Result<Self, CryptoError> {
        if seed.len() != width.seed_len() {
            return Err(CryptoError::InvalidSeedLength {
                expected: width.seed_len(),
                actual: seed.len(),
            });
        }

        let mut contribution = Vec::with_capacity(width.contribution_len());
        contribution.push(width.tag());

        let secrets: Vec<StaticSecret> = seed
            .chunks_exact(X25519_LEN)
            .map(|chunk| {
                let mut scalar = Zeroizing::new([0u8; X25519_LEN]);
                scalar.copy_from_slice(chunk);
                let secret = StaticSecret::from(*scalar);
                contribution.extend_from_slice(PublicKey::from(&secret).as_bytes());
                secret
            })
            .collect();

        Ok(Self { width, secrets, contribution })
    }

    /// Handshake width.
    pub fn width(&self) -> EcdhWidth {
        self.width
    }

    /// Public contribution to send to the peer.
    pub fn contribution(&self) -> &[u8] {
        &self.contribution
    }

    /// Combine our secrets with the peer's contribution.
    ///
    /// # Errors
    ///
    /// - `InvalidContributionLength` / `TagMismatch` for a malformed peer
    ///   contribution
    /// - `NonContributory` if any peer point is of low order
    pub fn agree(&self, peer: &[u8]) -> Result<SharedSecret, CryptoError> {
        let peer_keys = parse_contribution(self.width, peer)?;

        let mut shared = Zeroizing::new(Vec::with_capacity(self.width.seed_len()));
        for (secret, public) in self.secrets.iter().zip(peer_keys) {
            let exchange = secret.diffie_hellman(&public);
            if !exchange.was_contributory() {
                return Err(CryptoError::NonContributory);
            }
            shared.extend_from_slice(exchange.as_bytes());
        }

        Ok(SharedSecret(shared))
    }
}

impl fmt::Debug for EphemeralKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKey")
            .field("width", &self.width)
            .field("secrets", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Concatenated X25519 shared secrets. Zeroized on drop.
pub struct SharedSecret(Zeroizing<Vec<u8>>);

impl SharedSecret {
    /// Raw shared secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

/// Split a peer contribution into its public keys after checking the width
/// tag and length.
pub fn parse_contribution(width: EcdhWidth, bytes: &[u8]) -> Result<Vec<PublicKey>, CryptoError> {
    if bytes.len() != width.contribution_len() {
        return Err(CryptoError::InvalidContributionLength {
            expected: width.contribution_len(),
            actual: bytes.len(),
        });
    }

    let (&tag, keys) = bytes.split_first().ok_or(CryptoError::InvalidContributionLength {
        expected: width.contribution_len(),
        actual: 0,
    })?;
    if tag != width.tag() {
        return Err(CryptoError::TagMismatch { tag, expected: width.tag() });
    }

    Ok(keys
        .chunks_exact(X25519_LEN)
        .map(|chunk| {
            let mut key = [0u8; X25519_LEN];
            key.copy_from_slice(chunk);
            PublicKey::from(key)
        })
        .collect())
}

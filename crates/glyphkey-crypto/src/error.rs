//! Cryptographic error types.

use thiserror::Error;

/// Errors from ECDH contribution handling.
///
/// Every variant means the peer's contribution is unusable. None of them are
/// transient: retrying with the same input fails the same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Contribution has the wrong byte length for its width
    #[error("invalid contribution length: expected {expected} bytes, got {actual}")]
    InvalidContributionLength {
        /// Expected byte count
        expected: usize,
        /// Actual byte count
        actual: usize,
    },

    /// Leading tag byte does not name the expected width
    #[error("contribution tag {tag:#04x} does not match expected {expected:#04x}")]
    TagMismatch {
        /// Tag found in the contribution
        tag: u8,
        /// Tag required by the session type
        expected: u8,
    },

    /// Peer point produced an all-zero shared secret
    #[error("non-contributory peer public key")]
    NonContributory,

    /// Random seed buffer has the wrong size
    #[error("invalid seed length: expected {expected} bytes, got {actual}")]
    InvalidSeedLength {
        /// Expected byte count
        expected: usize,
        /// Actual byte count
        actual: usize,
    },
}

impl CryptoError {
    /// Returns true if the error was caused by peer-supplied data, as opposed
    /// to a local programming error.
    pub fn is_peer_error(&self) -> bool {
        !matches!(self, Self::InvalidSeedLength { .. })
    }
}

//! Codec error types.
//!
//! Every variant except [`CodecError::GroupNotValid`] is a format error: the
//! input is not (yet) a valid transcription. Format errors are expected while
//! a user is still typing and are never fatal. `GroupNotValid` is a contract
//! violation by the caller.

use thiserror::Error;

/// Errors from symbol decoding and block validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Character outside the alphabet
    #[error("invalid symbol {symbol:?} at position {position}")]
    InvalidSymbol {
        /// Offending character
        symbol: char,
        /// Character position in the input
        position: usize,
    },

    /// Input has the wrong number of symbols
    #[error("invalid length: expected {expected} symbols, got {actual}")]
    InvalidLength {
        /// Expected symbol count
        expected: usize,
        /// Actual symbol count
        actual: usize,
    },

    /// Trailing bits after the last full byte are not zero, or a whole
    /// superfluous symbol was supplied
    #[error("non-canonical padding in the last symbol")]
    NonCanonicalPadding,

    /// Recomputed checksum does not match the transcribed one
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// Block index outside the group layout
    #[error("block index {index} out of range for {count} blocks")]
    BlockIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of blocks in the group
        count: usize,
    },

    /// Value requested from a group that is not fully valid
    #[error("block group is not valid: {valid_blocks} of {total_blocks} blocks valid")]
    GroupNotValid {
        /// Blocks currently valid
        valid_blocks: usize,
        /// Blocks in the group
        total_blocks: usize,
    },
}

impl CodecError {
    /// Returns true if this error describes malformed input rather than a
    /// caller contract violation.
    pub fn is_format_error(&self) -> bool {
        match self {
            Self::InvalidSymbol { .. }
            | Self::InvalidLength { .. }
            | Self::NonCanonicalPadding
            | Self::ChecksumMismatch => true,

            Self::BlockIndexOutOfRange { .. } | Self::GroupNotValid { .. } => false,
        }
    }
}

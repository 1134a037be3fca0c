//! Glyphkey Codec
//!
//! Transcription-safe text encoding for key material. Pure functions and
//! small state objects with no I/O.
//!
//! # Layers
//!
//! ```text
//! bytes
//!   │  5 bits per symbol
//!   ▼
//! symbols (32-symbol alphabet, no 0/1/I/O)
//!   │  GF(32) position-weighted checksum
//!   ▼
//! Block: 4 data + 1 check symbol
//!   │  trailing aggregate checksum over all payload symbols
//!   ▼
//! BlockGroup
//! ```
//!
//! Block checksums catch substitutions and adjacent transpositions, the two
//! dominant human transcription errors. The aggregate checksum catches
//! blocks typed in the wrong order.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod alphabet;
pub mod block;
pub mod checksum;
mod error;

pub use alphabet::{Alphabet, RFC4648, STANDARD, decode, encode, symbols_for_bytes};
pub use block::{
    BLOCK_CHECK_SYMBOLS, BLOCK_DATA_SYMBOLS, BLOCK_SYMBOLS, Block, BlockGroup, BlockLayout,
    BlockState, GroupState,
};
pub use checksum::compute_checksum;
pub use error::CodecError;

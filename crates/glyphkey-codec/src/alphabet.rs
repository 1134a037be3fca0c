//! 32-symbol alphabets and 5-bit packing.
//!
//! Bytes are packed most significant bit first, five bits per symbol. The
//! final symbol is zero-padded on encode, and decode rejects non-zero padding
//! so that every byte string has exactly one text form.

use crate::error::CodecError;

/// Bits carried by a single symbol.
pub const BITS_PER_SYMBOL: usize = 5;

/// Marker for characters outside the alphabet in the lookup table.
const INVALID: u8 = 0xFF;

/// An ordered set of 32 ASCII symbols.
///
/// Encoding always emits the canonical (upper) case. Decoding accepts either
/// case.
#[derive(Debug)]
pub struct Alphabet {
    symbols: &'static [u8; 32],
    lookup: [u8; 128],
}

/// Transcription alphabet: digits 0/1 and letters I/O are removed because
/// they are easily confused with each other.
pub static STANDARD: Alphabet = Alphabet::new(b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ");

/// RFC 4648 base32 alphabet, used for PrivaSphere key text.
pub static RFC4648: Alphabet = Alphabet::new(b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567");

impl Alphabet {
    /// Build an alphabet from 32 distinct upper-case ASCII symbols.
    pub const fn new(symbols: &'static [u8; 32]) -> Self {
        let mut lookup = [INVALID; 128];
        let mut i = 0;
        while i < symbols.len() {
            let upper = symbols[i];
            lookup[upper as usize] = i as u8;
            lookup[upper.to_ascii_lowercase() as usize] = i as u8;
            i += 1;
        }
        Self { symbols, lookup }
    }

    /// Value (0..32) of a character, case-insensitive. `None` if the
    /// character is not in the alphabet.
    pub fn value_of(&self, c: char) -> Option<u8> {
        let code = usize::try_from(u32::from(c)).ok()?;
        match self.lookup.get(code) {
            Some(&value) if value != INVALID => Some(value),
            _ => None,
        }
    }

    /// Canonical character for a 5-bit value. Higher bits are ignored.
    pub fn symbol(&self, value: u8) -> char {
        char::from(self.symbols[usize::from(value & 0x1F)])
    }

    /// Check whether every character of `text` belongs to the alphabet.
    pub fn contains_all(&self, text: &str) -> bool {
        text.chars().all(|c| self.value_of(c).is_some())
    }

    /// Convert text to symbol values.
    pub fn to_values(&self, text: &str) -> Result<Vec<u8>, CodecError> {
        text.chars()
            .enumerate()
            .map(|(position, symbol)| {
                self.value_of(symbol).ok_or(CodecError::InvalidSymbol { symbol, position })
            })
            .collect()
    }

    /// Convert symbol values to canonical text.
    pub fn to_text(&self, values: &[u8]) -> String {
        values.iter().map(|&v| self.symbol(v)).collect()
    }

    /// Canonicalize text (upper case), validating every symbol.
    pub fn canonicalize(&self, text: &str) -> Result<String, CodecError> {
        self.to_values(text).map(|values| self.to_text(&values))
    }

    /// Encode bytes as symbols, five bits per symbol.
    pub fn encode(&self, bytes: &[u8]) -> String {
        self.to_text(&pack(bytes))
    }

    /// Decode symbols back to bytes.
    ///
    /// Fails on characters outside the alphabet and on non-zero padding.
    pub fn decode(&self, text: &str) -> Result<Vec<u8>, CodecError> {
        unpack(&self.to_values(text)?)
    }

    /// Decode symbols that must carry exactly `byte_len` bytes.
    pub fn decode_exact(&self, text: &str, byte_len: usize) -> Result<Vec<u8>, CodecError> {
        let expected = symbols_for_bytes(byte_len);
        let actual = text.chars().count();
        if actual != expected {
            return Err(CodecError::InvalidLength { expected, actual });
        }

        let bytes = self.decode(text)?;
        debug_assert_eq!(bytes.len(), byte_len);
        Ok(bytes)
    }
}

/// Number of symbols needed to carry `byte_len` bytes.
pub const fn symbols_for_bytes(byte_len: usize) -> usize {
    (byte_len * 8).div_ceil(BITS_PER_SYMBOL)
}

/// Encode bytes with the [`STANDARD`] alphabet.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode text with the [`STANDARD`] alphabet.
pub fn decode(text: &str) -> Result<Vec<u8>, CodecError> {
    STANDARD.decode(text)
}

/// Split bytes into 5-bit values.
pub fn pack(bytes: &[u8]) -> Vec<u8> {
    let mut values = Vec::with_capacity(symbols_for_bytes(bytes.len()));
    let mut buffer: u16 = 0;
    let mut bits = 0usize;

    for &byte in bytes {
        buffer = (buffer << 8) | u16::from(byte);
        bits += 8;
        while bits >= BITS_PER_SYMBOL {
            bits -= BITS_PER_SYMBOL;
            values.push(((buffer >> bits) & 0x1F) as u8);
        }
        buffer &= (1 << bits) - 1;
    }

    if bits > 0 {
        values.push(((buffer << (BITS_PER_SYMBOL - bits)) & 0x1F) as u8);
    }

    values
}

/// Join 5-bit values back into bytes.
pub fn unpack(values: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut bytes = Vec::with_capacity(values.len() * BITS_PER_SYMBOL / 8);
    let mut buffer: u16 = 0;
    let mut bits = 0usize;

    for &value in values {
        buffer = (buffer << BITS_PER_SYMBOL) | u16::from(value & 0x1F);
        bits += BITS_PER_SYMBOL;
        if bits >= 8 {
            bits -= 8;
            bytes.push((buffer >> bits) as u8);
        }
        buffer &= (1 << bits) - 1;
    }

    // A whole leftover symbol, or set padding bits, has no canonical encoder
    if bits >= BITS_PER_SYMBOL || buffer != 0 {
        return Err(CodecError::NonCanonicalPadding);
    }

    Ok(bytes)
}

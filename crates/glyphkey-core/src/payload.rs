//! QR payload classification.
//!
//! Scanned text is one of:
//!
//! - **Standard**: `SESSIONID:KEY[;SESSIONID:KEY...]`, key in the
//!   transcription alphabet
//! - **PrivaSphere**: `PSK1|id|partner|date|key`, key in RFC 4648 base32
//! - **Unrecognized**: anything else
//!
//! [`classify_payload`] is total and side-effect free. Malformed pairs inside
//! an otherwise standard payload are counted, not fatal; a payload with zero
//! usable pairs is not standard.

use glyphkey_codec::{CodecError, RFC4648, STANDARD};
use thiserror::Error;
use tracing::debug;

use crate::{key::KeyMaterial, session_id::SessionId};

/// Prefix identifying a PrivaSphere record.
pub const PRIVASPHERE_PREFIX: &str = "PSK1";

const PAIR_SEPARATOR: char = ';';
const ID_SEPARATOR: char = ':';
const FIELD_SEPARATOR: char = '|';

/// Key sizes a PrivaSphere record may carry.
const PRIVASPHERE_KEY_LENS: [usize; 2] = [16, 32];

/// Classification outcome. Exactly one holds for any input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// One or more session ID / key pairs
    Standard(StandardBatch),
    /// Out-of-band imported key
    PrivaSphere(PrivaSphereRecord),
    /// Neither format matched
    Unrecognized,
}

/// A session ID with its key text, validated for length and alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// Session identity
    pub session_id: SessionId,
    /// Canonical key symbols
    pub key_text: String,
}

/// Pairs extracted from a standard payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardBatch {
    /// Usable pairs, in payload order
    pub pairs: Vec<KeyPair>,
    /// Segments that did not form a usable pair
    pub rejected: usize,
}

/// Fields of a PrivaSphere record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivaSphereRecord {
    /// Record identity
    pub id: String,
    /// Partner label
    pub partner: String,
    /// Creation date, as written by the issuer
    pub date: String,
    /// Decoded key
    pub key: KeyMaterial,
}

/// Why a PrivaSphere record could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// Text does not start with the record prefix
    #[error("missing PSK1 prefix")]
    MissingPrefix,

    /// Wrong number of `|`-separated fields
    #[error("expected 4 fields, got {actual}")]
    FieldCount {
        /// Fields found after the prefix
        actual: usize,
    },

    /// Required field is blank
    #[error("empty {field} field")]
    EmptyField {
        /// Field name
        field: &'static str,
    },

    /// Key text is not valid base32
    #[error("invalid key text: {0}")]
    Key(#[from] CodecError),

    /// Key decodes to an unsupported size
    #[error("unsupported key length {actual} bytes")]
    KeyLength {
        /// Decoded byte count
        actual: usize,
    },
}

/// Classify scanned text.
pub fn classify_payload(text: &str) -> Payload {
    if let Ok(record) = PrivaSphereRecord::parse(text) {
        return Payload::PrivaSphere(record);
    }
    match standard_keys(text) {
        Some(batch) => Payload::Standard(batch),
        None => Payload::Unrecognized,
    }
}

/// True if `text` yields at least one standard pair.
pub fn is_standard_key(text: &str) -> bool {
    standard_keys(text).is_some()
}

/// Extract standard pairs. `None` if no pair is usable.
pub fn standard_keys(text: &str) -> Option<StandardBatch> {
    let mut batch = StandardBatch { pairs: Vec::new(), rejected: 0 };

    for segment in text.trim().split(PAIR_SEPARATOR).map(str::trim) {
        if segment.is_empty() {
            continue;
        }
        match parse_pair(segment) {
            Some(pair) => batch.pairs.push(pair),
            None => batch.rejected += 1,
        }
    }

    if batch.pairs.is_empty() {
        return None;
    }
    if batch.rejected > 0 {
        debug!(accepted = batch.pairs.len(), rejected = batch.rejected, "partial standard payload");
    }
    Some(batch)
}

fn parse_pair(segment: &str) -> Option<KeyPair> {
    let (id_text, key_text) = segment.split_once(ID_SEPARATOR)?;
    let session_id = SessionId::parse_text(id_text.trim()).ok()?;

    let key_text = key_text.trim();
    let bytes = STANDARD
        .decode_exact(key_text, session_id.session_type().key_material_len())
        .ok()?;
    debug_assert_eq!(bytes.len(), session_id.session_type().key_material_len());

    Some(KeyPair { session_id, key_text: key_text.to_ascii_uppercase() })
}

/// Render pairs in the standard format, for display as a QR code.
pub fn format_standard(pairs: &[KeyPair]) -> String {
    pairs
        .iter()
        .map(|pair| format!("{}:{}", pair.session_id, pair.key_text))
        .collect::<Vec<_>>()
        .join(";")
}

impl PrivaSphereRecord {
    /// Strict decoding of a PrivaSphere record.
    pub fn parse(text: &str) -> Result<Self, PayloadError> {
        let text = text.trim();
        let rest = text
            .get(..PRIVASPHERE_PREFIX.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(PRIVASPHERE_PREFIX))
            .and_then(|_| text.get(PRIVASPHERE_PREFIX.len()..))
            .ok_or(PayloadError::MissingPrefix)?;
        let rest = rest.strip_prefix(FIELD_SEPARATOR).unwrap_or(rest);

        let fields: Vec<&str> = rest.split(FIELD_SEPARATOR).map(str::trim).collect();
        let [id, partner, date, key] = fields[..] else {
            return Err(PayloadError::FieldCount { actual: fields.len() });
        };

        for (field, value) in [("id", id), ("partner", partner), ("date", date), ("key", key)] {
            if value.is_empty() {
                return Err(PayloadError::EmptyField { field });
            }
        }

        let bytes = RFC4648.decode(key.trim_end_matches('='))?;
        if !PRIVASPHERE_KEY_LENS.contains(&bytes.len()) {
            return Err(PayloadError::KeyLength { actual: bytes.len() });
        }

        Ok(Self {
            id: id.to_owned(),
            partner: partner.to_owned(),
            date: date.to_owned(),
            key: KeyMaterial::new(bytes),
        })
    }
}

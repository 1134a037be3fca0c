//! Session identifiers: a type discriminator plus a correlation token.
//!
//! The text form is four symbols from the transcription alphabet: one type
//! symbol followed by a three-symbol token. The same four symbols are the data
//! of the selector block a user types before the key blocks.

use std::fmt;

use glyphkey_codec::{BlockLayout, CodecError, STANDARD, symbols_for_bytes};
use glyphkey_crypto::EcdhWidth;

use crate::{env::Environment, error::FormatError};

/// Symbols in a correlation token.
pub const TOKEN_SYMBOLS: usize = 3;

/// Symbols in the text form of a session ID.
pub const SESSION_ID_SYMBOLS: usize = 1 + TOKEN_SYMBOLS;

/// Handshake role a session type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Key material is the session key itself
    SessionKey,
    /// Peer is asking us to respond to its ECDH contribution
    EcdhRequest,
    /// Peer is answering an ECDH request we issued
    EcdhResponse,
}

/// Kind and width of the key material a session carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionType {
    /// Direct 128-bit session key
    SessionKey128,
    /// Direct 256-bit session key
    SessionKey256,
    /// ECDH request, derives a 128-bit key
    EcdhReq256,
    /// ECDH response, derives a 128-bit key
    EcdhRes256,
    /// ECDH request, derives a 256-bit key
    EcdhReq512,
    /// ECDH response, derives a 256-bit key
    EcdhRes512,
}

impl SessionType {
    /// Every session type, in discriminator order.
    pub const ALL: [Self; 6] = [
        Self::SessionKey128,
        Self::SessionKey256,
        Self::EcdhReq256,
        Self::EcdhRes256,
        Self::EcdhReq512,
        Self::EcdhRes512,
    ];

    /// Type for a discriminator symbol (case-insensitive).
    pub fn from_symbol(symbol: char) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.symbol() == symbol.to_ascii_uppercase())
    }

    /// Canonical discriminator symbol.
    pub const fn symbol(self) -> char {
        match self {
            Self::SessionKey128 => '2',
            Self::SessionKey256 => '3',
            Self::EcdhReq256 => '4',
            Self::EcdhRes256 => '5',
            Self::EcdhReq512 => '6',
            Self::EcdhRes512 => '7',
        }
    }

    /// Handshake role.
    pub const fn role(self) -> Role {
        match self {
            Self::SessionKey128 | Self::SessionKey256 => Role::SessionKey,
            Self::EcdhReq256 | Self::EcdhReq512 => Role::EcdhRequest,
            Self::EcdhRes256 | Self::EcdhRes512 => Role::EcdhResponse,
        }
    }

    /// Block count and aggregate checksum size for manual entry.
    pub const fn required_layout(self) -> BlockLayout {
        match self {
            Self::SessionKey128 => BlockLayout::new(7, 2),
            Self::SessionKey256 => BlockLayout::new(14, 4),
            Self::EcdhReq256 | Self::EcdhRes256 => BlockLayout::new(14, 3),
            Self::EcdhReq512 | Self::EcdhRes512 => BlockLayout::new(27, 4),
        }
    }

    /// ECDH width, `None` for direct session keys.
    pub const fn ecdh_width(self) -> Option<EcdhWidth> {
        match self {
            Self::SessionKey128 | Self::SessionKey256 => None,
            Self::EcdhReq256 | Self::EcdhRes256 => Some(EcdhWidth::W256),
            Self::EcdhReq512 | Self::EcdhRes512 => Some(EcdhWidth::W512),
        }
    }

    /// Key material size in bytes: the session key, or the ECDH contribution.
    pub const fn key_material_len(self) -> usize {
        match self {
            Self::SessionKey128 => 16,
            Self::SessionKey256 => 32,
            Self::EcdhReq256 | Self::EcdhRes256 => EcdhWidth::W256.contribution_len(),
            Self::EcdhReq512 | Self::EcdhRes512 => EcdhWidth::W512.contribution_len(),
        }
    }

    /// Key material size in symbols.
    pub const fn key_symbols(self) -> usize {
        symbols_for_bytes(self.key_material_len())
    }

    /// Matching response type for an ECDH request.
    pub const fn response_type(self) -> Option<Self> {
        match self {
            Self::EcdhReq256 => Some(Self::EcdhRes256),
            Self::EcdhReq512 => Some(Self::EcdhRes512),
            _ => None,
        }
    }

    /// Session key type an ECDH handshake of this width derives.
    pub const fn derived_key_type(self) -> Option<Self> {
        match self {
            Self::EcdhReq256 | Self::EcdhRes256 => Some(Self::SessionKey128),
            Self::EcdhReq512 | Self::EcdhRes512 => Some(Self::SessionKey256),
            Self::SessionKey128 | Self::SessionKey256 => None,
        }
    }

    /// Request type for an ECDH width.
    pub const fn request_for(width: EcdhWidth) -> Self {
        match width {
            EcdhWidth::W256 => Self::EcdhReq256,
            EcdhWidth::W512 => Self::EcdhReq512,
        }
    }
}

/// Immutable `{type, token}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId {
    session_type: SessionType,
    random: String,
}

impl SessionId {
    /// Parse a type symbol and a correlation token.
    ///
    /// The token is canonicalized to upper case.
    ///
    /// # Errors
    ///
    /// - `UnknownSessionType` if the discriminator is unknown
    /// - `Codec` if the token has the wrong length or foreign symbols
    pub fn parse(type_symbol: char, random: &str) -> Result<Self, FormatError> {
        let session_type = SessionType::from_symbol(type_symbol)
            .ok_or(FormatError::UnknownSessionType { symbol: type_symbol })?;

        let actual = random.chars().count();
        if actual != TOKEN_SYMBOLS {
            return Err(CodecError::InvalidLength { expected: TOKEN_SYMBOLS, actual }.into());
        }

        Ok(Self { session_type, random: STANDARD.canonicalize(random)? })
    }

    /// Parse the four-symbol text form.
    pub fn parse_text(text: &str) -> Result<Self, FormatError> {
        let mut chars = text.chars();
        let Some(type_symbol) = chars.next() else {
            return Err(CodecError::InvalidLength {
                expected: SESSION_ID_SYMBOLS,
                actual: 0,
            }
            .into());
        };
        Self::parse(type_symbol, chars.as_str())
    }

    /// Parse from selector block data values.
    pub fn from_values(values: &[u8]) -> Result<Self, FormatError> {
        Self::parse_text(&STANDARD.to_text(values))
    }

    /// Fresh session ID with a random token.
    pub fn generate<E: Environment>(session_type: SessionType, env: &E) -> Self {
        let mut bytes = [0u8; TOKEN_SYMBOLS];
        env.random_bytes(&mut bytes);
        Self { session_type, random: STANDARD.to_text(&bytes) }
    }

    /// Same token under another type.
    pub fn with_type(&self, session_type: SessionType) -> Self {
        Self { session_type, random: self.random.clone() }
    }

    /// Session type.
    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    /// Correlation token.
    pub fn random(&self) -> &str {
        &self.random
    }

    /// Handshake role.
    pub fn role(&self) -> Role {
        self.session_type.role()
    }

    /// Direct session key.
    pub fn is_session_key(&self) -> bool {
        self.role() == Role::SessionKey
    }

    /// ECDH request from a peer.
    pub fn is_ecdh_req(&self) -> bool {
        self.role() == Role::EcdhRequest
    }

    /// ECDH response to one of our requests.
    pub fn is_ecdh_res(&self) -> bool {
        self.role() == Role::EcdhResponse
    }

    /// Block layout for manual entry of this session's key material.
    pub fn required_layout(&self) -> BlockLayout {
        self.session_type.required_layout()
    }

    /// Four-symbol canonical text.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Symbol values of the text form, as typed in the selector block.
    pub fn to_values(&self) -> Vec<u8> {
        let mut values = Vec::with_capacity(SESSION_ID_SYMBOLS);
        values.extend(STANDARD.value_of(self.session_type.symbol()));
        values.extend(self.random.chars().filter_map(|c| STANDARD.value_of(c)));
        values
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.session_type.symbol(), self.random)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::env::test_utils::SeededEnv;

    #[test]
    fn parse_known_types() {
        let id = SessionId::parse('4', "k7q").unwrap();
        assert_eq!(id.session_type(), SessionType::EcdhReq256);
        assert_eq!(id.random(), "K7Q");
        assert_eq!(id.to_text(), "4K7Q");
        assert!(id.is_ecdh_req());
    }

    #[test]
    fn parse_rejects_unknown_discriminator() {
        assert_eq!(
            SessionId::parse('9', "ABC"),
            Err(FormatError::UnknownSessionType { symbol: '9' })
        );
    }

    #[test]
    fn parse_rejects_bad_token() {
        assert_eq!(
            SessionId::parse('2', "AB"),
            Err(FormatError::Codec(CodecError::InvalidLength { expected: 3, actual: 2 }))
        );
        assert!(matches!(
            SessionId::parse('2', "AB0"),
            Err(FormatError::Codec(CodecError::InvalidSymbol { symbol: '0', .. }))
        ));
    }

    #[test]
    fn parse_text_round_trip() {
        let id = SessionId::parse_text("7xyz").unwrap();
        assert_eq!(SessionId::parse_text(&id.to_text()).unwrap(), id);
        assert!(SessionId::parse_text("").is_err());
    }

    #[test]
    fn roles_partition_types() {
        for t in SessionType::ALL {
            let id = SessionId::parse(t.symbol(), "222").unwrap();
            let roles = [id.is_session_key(), id.is_ecdh_req(), id.is_ecdh_res()];
            assert_eq!(roles.iter().filter(|&&r| r).count(), 1, "{t:?}");
        }
    }

    #[test]
    fn layouts_carry_exact_key_material() {
        for t in SessionType::ALL {
            assert_eq!(t.required_layout().payload_symbols(), t.key_symbols(), "{t:?}");
        }
        assert_eq!(SessionType::SessionKey128.key_symbols(), 26);
        assert_eq!(SessionType::SessionKey256.key_symbols(), 52);
        assert_eq!(SessionType::EcdhReq256.key_symbols(), 53);
        assert_eq!(SessionType::EcdhRes512.key_symbols(), 104);
    }

    #[test]
    fn response_and_derived_types() {
        assert_eq!(SessionType::EcdhReq256.response_type(), Some(SessionType::EcdhRes256));
        assert_eq!(SessionType::EcdhRes256.response_type(), None);
        assert_eq!(SessionType::EcdhRes512.derived_key_type(), Some(SessionType::SessionKey256));
        assert_eq!(SessionType::SessionKey128.derived_key_type(), None);
    }

    #[test]
    fn generate_uses_environment() {
        let a = SessionId::generate(SessionType::EcdhReq512, &SeededEnv::new(3));
        let b = SessionId::generate(SessionType::EcdhReq512, &SeededEnv::new(3));
        assert_eq!(a, b);
        assert_eq!(a.random().len(), TOKEN_SYMBOLS);
        assert!(STANDARD.contains_all(a.random()));
    }

    #[test]
    fn values_match_text() {
        let id = SessionId::parse('3', "MNP").unwrap();
        assert_eq!(SessionId::from_values(&id.to_values()).unwrap(), id);
    }
}

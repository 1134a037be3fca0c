//! Encrypted file header.
//!
//! Encrypted files carry the `enc` extension and start with a fixed 16-byte
//! header: the 4-byte ASCII id of the key used (its session ID text) followed
//! by the 12-byte IV. The body is opaque here.

use std::path::{Path, PathBuf};

use crate::{
    error::{FileHeaderError, FormatError},
    key::Key,
    session_id::SessionId,
    store::{KeyStore, StoreError},
};

/// Extension of encrypted files.
pub const ENCRYPTED_EXTENSION: &str = "enc";

/// Bytes of the key id.
pub const KEY_ID_LEN: usize = 4;

/// Bytes of the IV.
pub const IV_LEN: usize = 12;

/// Total header size.
pub const HEADER_LEN: usize = KEY_ID_LEN + IV_LEN;

/// Parsed header of an encrypted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedFileHeader {
    key_id: String,
    iv: [u8; IV_LEN],
}

impl EncryptedFileHeader {
    /// Header for a key id and IV.
    pub fn new(key_id: &str, iv: [u8; IV_LEN]) -> Result<Self, FileHeaderError> {
        if key_id.len() != KEY_ID_LEN || !key_id.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(FileHeaderError::InvalidKeyId);
        }
        Ok(Self { key_id: key_id.to_owned(), iv })
    }

    /// Parse the header from the start of a file. Trailing bytes are the body
    /// and are ignored.
    pub fn parse(bytes: &[u8]) -> Result<Self, FileHeaderError> {
        let (Some(id), Some(iv)) =
            (bytes.get(..KEY_ID_LEN), bytes.get(KEY_ID_LEN..HEADER_LEN))
        else {
            return Err(FileHeaderError::TooShort { expected: HEADER_LEN, actual: bytes.len() });
        };

        let key_id = std::str::from_utf8(id).map_err(|_| FileHeaderError::InvalidKeyId)?;
        let mut buf = [0u8; IV_LEN];
        buf.copy_from_slice(iv);
        Self::new(key_id, buf)
    }

    /// Serialized header.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..KEY_ID_LEN].copy_from_slice(self.key_id.as_bytes());
        out[KEY_ID_LEN..].copy_from_slice(&self.iv);
        out
    }

    /// Key id as written.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// IV.
    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    /// Key id parsed as a session ID.
    pub fn session_id(&self) -> Result<SessionId, FormatError> {
        SessionId::parse_text(&self.key_id)
    }

    /// Key this file was encrypted with, if the store has it. The id is
    /// canonicalized first, so lower-case headers still match.
    pub fn find_key<S: KeyStore>(&self, store: &S) -> Result<Option<Key>, StoreError> {
        let id = self.session_id().map_or_else(|_| self.key_id.clone(), |id| id.to_text());
        store.get(&id)
    }
}

/// True if `path` has the encrypted-file extension (case-insensitive).
pub fn is_encrypted_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case(ENCRYPTED_EXTENSION))
}

/// Path of the encrypted counterpart: `report.pdf` -> `report.pdf.enc`.
pub fn encrypted_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ENCRYPTED_EXTENSION);
    PathBuf::from(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        key::{KeyMaterial, KeyState, SessionKey},
        store::MemoryKeyStore,
    };

    #[test]
    fn parse_round_trip() {
        let header = EncryptedFileHeader::new("2ABC", [7; IV_LEN]).unwrap();
        let mut file = header.to_bytes().to_vec();
        file.extend_from_slice(b"ciphertext");

        let parsed = EncryptedFileHeader::parse(&file).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.session_id().unwrap().to_text(), "2ABC");
    }

    #[test]
    fn short_header_is_rejected() {
        assert_eq!(
            EncryptedFileHeader::parse(b"2ABC1234"),
            Err(FileHeaderError::TooShort { expected: 16, actual: 8 })
        );
    }

    #[test]
    fn non_ascii_key_id_is_rejected() {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[..4].copy_from_slice(&[0xFF, b'A', b'B', b'C']);
        assert_eq!(EncryptedFileHeader::parse(&bytes), Err(FileHeaderError::InvalidKeyId));
    }

    #[test]
    fn finds_key_in_store() {
        let mut store = MemoryKeyStore::new();
        store
            .add(Key::Session(SessionKey {
                session_id: SessionId::parse_text("3XYZ").unwrap(),
                partner: "Bob".into(),
                state: KeyState::Usable,
                key: KeyMaterial::new(vec![1; 32]),
                created_at: 0,
            }))
            .unwrap();

        let header = EncryptedFileHeader::new("3xyz", [0; IV_LEN]).unwrap();
        assert!(header.find_key(&store).unwrap().is_some());

        let missing = EncryptedFileHeader::new("2XYZ", [0; IV_LEN]).unwrap();
        assert!(missing.find_key(&store).unwrap().is_none());
    }

    #[test]
    fn encrypted_extension() {
        assert!(is_encrypted_path(Path::new("notes.txt.enc")));
        assert!(is_encrypted_path(Path::new("NOTES.ENC")));
        assert!(!is_encrypted_path(Path::new("notes.txt")));
        assert_eq!(encrypted_path(Path::new("a/report.pdf")), PathBuf::from("a/report.pdf.enc"));
    }
}

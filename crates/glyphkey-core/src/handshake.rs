//! Handshake orchestration.
//!
//! [`Handshake`] dispatches validated `(SessionId, key text)` pairs by role and
//! is the only mutator of the key store:
//!
//! - **Session key**: store the key directly as [`KeyState::Remote`]
//! - **ECDH request**: answer with a fresh ephemeral key, derive and store the
//!   session key as Remote, and hand the response back for display. A
//!   repeated request gets the response it got before
//! - **ECDH response**: complete our own pending request, store the session
//!   key as [`KeyState::Usable`], and drop the consumed request
//!
//! Every check that can fail runs before the first store mutation, so a
//! rejected pair leaves the store untouched. Pairs in a batch are processed
//! independently.

use std::collections::VecDeque;

use glyphkey_codec::{BLOCK_CHECK_SYMBOLS, Block, BlockGroup, CodecError, STANDARD, encode};
use glyphkey_crypto::{EcdhWidth, derive_session_key};
use tracing::{debug, info, warn};

use crate::{
    env::Environment,
    error::{HandshakeError, StateError},
    key::{EcdhKey, Key, KeyMaterial, KeyState, PrivaSphereKey, SessionKey},
    payload::{KeyPair, PrivaSphereRecord, StandardBatch, format_standard},
    session_id::{Role, SessionId, SessionType},
    store::KeyStore,
};

/// Partner label for keys that arrive from an unknown peer.
pub const DEFAULT_REMOTE_PARTNER: &str = "Remote";

/// Attempts at finding a correlation token that is free in the store.
const MAX_TOKEN_ATTEMPTS: usize = 16;

/// Responses remembered for answering a repeated request.
const ISSUED_RESPONSES: usize = 32;

/// Code generated for the peer: a request we initiated, or our response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    /// Session identity to transmit
    pub session_id: SessionId,
    /// Key symbols to transmit
    pub key_text: String,
}

impl GeneratedCode {
    /// As a standard payload pair.
    pub fn pair(&self) -> KeyPair {
        KeyPair { session_id: self.session_id.clone(), key_text: self.key_text.clone() }
    }

    /// Standard QR payload text.
    pub fn qr_text(&self) -> String {
        format_standard(&[self.pair()])
    }

    /// Blocks for manual transcription: the selector block followed by the
    /// key blocks.
    pub fn blocks(&self) -> Result<Vec<String>, CodecError> {
        let mut blocks = vec![Block::encode(&self.session_id.to_values(), BLOCK_CHECK_SYMBOLS)];
        blocks.extend(BlockGroup::encode(self.session_id.required_layout(), &self.key_text)?);
        Ok(blocks)
    }
}

/// Summary of a stored session key. Never carries key bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredKey {
    /// Session identity of the stored key
    pub session_id: SessionId,
    /// Partner label
    pub partner: String,
    /// State the key was stored in
    pub state: KeyState,
}

/// Result of processing one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPairOutcome {
    /// Key written to the store
    pub stored: StoredKey,
    /// Response to re-transmit, for ECDH requests
    pub response: Option<GeneratedCode>,
}

/// Per-pair results of a batch, in payload order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One result per extracted pair
    pub results: Vec<(SessionId, Result<KeyPairOutcome, HandshakeError>)>,
    /// Segments the payload parser could not use
    pub rejected: usize,
}

impl BatchReport {
    /// Responses generated during the batch.
    pub fn responses(&self) -> Vec<GeneratedCode> {
        self.outcomes().filter_map(|outcome| outcome.response.clone()).collect()
    }

    /// Successfully stored keys.
    pub fn stored(&self) -> Vec<&StoredKey> {
        self.outcomes().map(|outcome| &outcome.stored).collect()
    }

    /// Failed pairs.
    pub fn errors(&self) -> Vec<(&SessionId, &HandshakeError)> {
        self.results
            .iter()
            .filter_map(|(id, result)| result.as_ref().err().map(|err| (id, err)))
            .collect()
    }

    fn outcomes(&self) -> impl Iterator<Item = &KeyPairOutcome> {
        self.results.iter().filter_map(|(_, result)| result.as_ref().ok())
    }
}

/// Response already sent for a peer request.
#[derive(Debug, Clone)]
struct IssuedResponse {
    request_id: SessionId,
    request: Vec<u8>,
    derived_id: SessionId,
    response: GeneratedCode,
}

/// Handshake orchestrator. Owns the environment and the key store.
pub struct Handshake<E: Environment, S: KeyStore> {
    env: E,
    store: S,
    remote_partner: String,
    /// Most recent first.
    issued: VecDeque<IssuedResponse>,
}

impl<E: Environment, S: KeyStore> Handshake<E, S> {
    /// Create an orchestrator over `store`.
    pub fn new(env: E, store: S) -> Self {
        Self {
            env,
            store,
            remote_partner: DEFAULT_REMOTE_PARTNER.to_owned(),
            issued: VecDeque::with_capacity(ISSUED_RESPONSES),
        }
    }

    /// Partner label for keys received from a peer.
    #[must_use]
    pub fn with_remote_partner(mut self, partner: impl Into<String>) -> Self {
        self.remote_partner = partner.into();
        self
    }

    /// Read access to the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give back the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Start an ECDH handshake: store a pending request and return it for
    /// transmission.
    ///
    /// The token is redrawn while it names a pending request or a stored
    /// session key that completing this request would replace.
    pub fn initiate(
        &mut self,
        width: EcdhWidth,
        partner: impl Into<String>,
    ) -> Result<GeneratedCode, HandshakeError> {
        let session_type = SessionType::request_for(width);
        let Some(derived_type) = session_type.derived_key_type() else {
            unreachable!("request types have a derived type");
        };

        let mut attempts = 0;
        let session_id = loop {
            if attempts == MAX_TOKEN_ATTEMPTS {
                return Err(HandshakeError::TokenExhausted { attempts });
            }
            attempts += 1;

            let candidate = SessionId::generate(session_type, &self.env);
            if self.store.lookup_ecdh_key(candidate.random())?.is_some() {
                continue;
            }
            if self.store.get(&candidate.with_type(derived_type).to_text())?.is_some() {
                debug!(token = %candidate.random(), "token names a stored key, redrawing");
                continue;
            }
            break candidate;
        };

        let key = EcdhKey::initiate(session_id, width, partner, &self.env)?;
        let code = GeneratedCode {
            session_id: key.session_id.clone(),
            key_text: encode(key.contribution()),
        };

        info!(session = %code.session_id, partner = %key.partner, "ECDH request initiated");
        self.store.add(Key::Ecdh(key))?;
        Ok(code)
    }

    /// Dispatch one pair by role.
    ///
    /// # Errors
    ///
    /// - `Format` if the key text does not decode to the exact material size
    /// - `Crypto` if the peer contribution is rejected
    /// - `UnknownSession` for a response with no pending request
    /// - `Store` if the store fails
    pub fn process_key_pair(
        &mut self,
        session_id: &SessionId,
        key_text: &str,
    ) -> Result<KeyPairOutcome, HandshakeError> {
        let material =
            STANDARD.decode_exact(key_text, session_id.session_type().key_material_len())?;

        let outcome = match session_id.role() {
            Role::SessionKey => self.store_session_key(session_id, material)?,
            Role::EcdhRequest => self.respond(session_id, &material)?,
            Role::EcdhResponse => self.complete(session_id, &material)?,
        };

        info!(
            session = %outcome.stored.session_id,
            state = ?outcome.stored.state,
            responded = outcome.response.is_some(),
            "key stored"
        );
        Ok(outcome)
    }

    /// Process every pair of a standard batch. A failing pair does not affect
    /// the others.
    pub fn process_batch(&mut self, batch: &StandardBatch) -> BatchReport {
        let results = batch
            .pairs
            .iter()
            .map(|pair| {
                let result = self.process_key_pair(&pair.session_id, &pair.key_text);
                if let Err(err) = &result {
                    warn!(session = %pair.session_id, error = %err, "key pair rejected");
                }
                (pair.session_id.clone(), result)
            })
            .collect();

        BatchReport { results, rejected: batch.rejected }
    }

    /// Store a key from a PrivaSphere record. Returns its store identity.
    pub fn import_privasphere(
        &mut self,
        record: PrivaSphereRecord,
    ) -> Result<String, HandshakeError> {
        let key = PrivaSphereKey {
            id: record.id,
            partner: record.partner,
            creation_date: record.date,
            last_use_date: None,
            last_activity: Some(self.env.wall_clock_secs()),
            key: record.key,
        };
        let id = key.id.clone();

        info!(id = %id, partner = %key.partner, "PrivaSphere key imported");
        self.store.add(Key::PrivaSphere(key))?;
        Ok(id)
    }

    /// User confirmation of a remote session key.
    pub fn confirm(&mut self, id: &str) -> Result<(), HandshakeError> {
        let mut key = self.session_key(id)?;
        key.confirm()?;

        debug!(session = %key.session_id, "key confirmed");
        self.store.add(Key::Session(key))?;
        Ok(())
    }

    /// Explicit deletion by the user. Returns false if no such key exists.
    pub fn delete(&mut self, id: &str) -> Result<bool, HandshakeError> {
        let removed = self.store.remove(id)?.is_some();
        if removed {
            info!(id = %id, "key deleted");
        }
        Ok(removed)
    }

    fn session_key(&self, id: &str) -> Result<SessionKey, HandshakeError> {
        match self.store.get(id)? {
            Some(Key::Session(key)) => Ok(key),
            Some(other) => Err(StateError { state: other.state(), operation: "confirm" }.into()),
            None => Err(HandshakeError::KeyNotFound { id: id.to_owned() }),
        }
    }

    fn store_session_key(
        &mut self,
        session_id: &SessionId,
        material: Vec<u8>,
    ) -> Result<KeyPairOutcome, HandshakeError> {
        let key = SessionKey {
            session_id: session_id.clone(),
            partner: self.remote_partner.clone(),
            state: KeyState::Remote,
            key: KeyMaterial::new(material),
            created_at: self.env.wall_clock_secs(),
        };
        let stored = summary(&key);

        self.store.add(Key::Session(key))?;
        Ok(KeyPairOutcome { stored, response: None })
    }

    /// Answer a peer's request.
    ///
    /// A request seen before gets the same response again, as long as the
    /// session key it derived is still stored. Answering it with a fresh
    /// ephemeral key would replace that key with one the peer never derives.
    fn respond(
        &mut self,
        session_id: &SessionId,
        request: &[u8],
    ) -> Result<KeyPairOutcome, HandshakeError> {
        if let Some(outcome) = self.reissue(session_id, request)? {
            debug!(session = %session_id, "repeated request, response reissued");
            return Ok(outcome);
        }

        let session_type = session_id.session_type();
        let (Some(width), Some(response_type), Some(derived_type)) = (
            session_type.ecdh_width(),
            session_type.response_type(),
            session_type.derived_key_type(),
        ) else {
            unreachable!("request types have a width, a response type and a derived type");
        };

        let responder = EcdhKey::respond(
            session_id.with_type(response_type),
            width,
            self.remote_partner.clone(),
            &self.env,
        )?;
        let shared = responder.ephemeral.agree(request)?;
        let derived = derive_session_key(
            width,
            &shared,
            session_id.random().as_bytes(),
            request,
            responder.contribution(),
        );

        let key = SessionKey {
            session_id: session_id.with_type(derived_type),
            partner: responder.partner.clone(),
            state: KeyState::Remote,
            key: derived.into(),
            created_at: self.env.wall_clock_secs(),
        };
        let stored = summary(&key);
        let response = GeneratedCode {
            session_id: responder.session_id.clone(),
            key_text: encode(responder.contribution()),
        };

        self.store.add(Key::Session(key))?;
        self.remember(IssuedResponse {
            request_id: session_id.clone(),
            request: request.to_vec(),
            derived_id: stored.session_id.clone(),
            response: response.clone(),
        });

        Ok(KeyPairOutcome { stored, response: Some(response) })
    }

    fn reissue(
        &self,
        session_id: &SessionId,
        request: &[u8],
    ) -> Result<Option<KeyPairOutcome>, HandshakeError> {
        let Some(issued) = self
            .issued
            .iter()
            .find(|issued| issued.request_id == *session_id && issued.request == request)
        else {
            return Ok(None);
        };

        match self.store.get(&issued.derived_id.to_text())? {
            Some(Key::Session(key)) => Ok(Some(KeyPairOutcome {
                stored: summary(&key),
                response: Some(issued.response.clone()),
            })),
            _ => Ok(None),
        }
    }

    fn remember(&mut self, issued: IssuedResponse) {
        self.issued.retain(|old| old.request_id != issued.request_id);
        if self.issued.len() == ISSUED_RESPONSES {
            self.issued.pop_back();
        }
        self.issued.push_front(issued);
    }

    /// Complete one of our own requests.
    fn complete(
        &mut self,
        session_id: &SessionId,
        response: &[u8],
    ) -> Result<KeyPairOutcome, HandshakeError> {
        let unknown = || HandshakeError::UnknownSession { session_id: session_id.clone() };

        let pending = self.store.lookup_ecdh_key(session_id.random())?.ok_or_else(unknown)?;
        let request_type = pending.session_id.session_type();
        if request_type.response_type() != Some(session_id.session_type()) {
            return Err(unknown());
        }

        let (Some(width), Some(derived_type)) =
            (request_type.ecdh_width(), request_type.derived_key_type())
        else {
            unreachable!("request types have a width and a derived type");
        };

        let shared = pending.ephemeral.agree(response)?;
        let derived = derive_session_key(
            width,
            &shared,
            session_id.random().as_bytes(),
            pending.contribution(),
            response,
        );

        let key = SessionKey {
            session_id: session_id.with_type(derived_type),
            partner: pending.partner.clone(),
            state: KeyState::Usable,
            key: derived.into(),
            created_at: self.env.wall_clock_secs(),
        };
        let stored = summary(&key);

        self.store.add(Key::Session(key))?;
        self.store.remove(&pending.session_id.to_text())?;
        Ok(KeyPairOutcome { stored, response: None })
    }
}

fn summary(key: &SessionKey) -> StoredKey {
    StoredKey {
        session_id: key.session_id.clone(),
        partner: key.partner.clone(),
        state: key.state,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{
        env::test_utils::SeededEnv,
        store::{MemoryKeyStore, StoreError},
    };

    fn handshake(seed: u64) -> Handshake<SeededEnv, MemoryKeyStore> {
        Handshake::new(SeededEnv::new(seed), MemoryKeyStore::new())
    }

    fn session_bytes(handshake: &Handshake<SeededEnv, MemoryKeyStore>, id: &str) -> Vec<u8> {
        match handshake.store().get(id).unwrap() {
            Some(Key::Session(key)) => key.key.as_bytes().to_vec(),
            other => unreachable!("expected session key at {id}, got {other:?}"),
        }
    }

    #[test]
    fn session_key_is_stored_remote() {
        let mut alice = handshake(1);
        let id = SessionId::parse_text("2ABC").unwrap();

        let outcome = alice.process_key_pair(&id, &encode(&[9; 16])).unwrap();
        assert_eq!(outcome.stored.state, KeyState::Remote);
        assert_eq!(outcome.stored.partner, DEFAULT_REMOTE_PARTNER);
        assert!(outcome.response.is_none());
        assert_eq!(session_bytes(&alice, "2ABC"), vec![9; 16]);
    }

    #[test]
    fn full_handshake_derives_same_key() {
        for width in [EcdhWidth::W256, EcdhWidth::W512] {
            let mut alice = handshake(1);
            let mut bob = handshake(2);

            let request = alice.initiate(width, "Bob").unwrap();
            let answered = bob.process_key_pair(&request.session_id, &request.key_text).unwrap();
            let response = answered.response.unwrap();
            let completed = alice.process_key_pair(&response.session_id, &response.key_text).unwrap();

            assert_eq!(answered.stored.session_id, completed.stored.session_id);
            assert_eq!(completed.stored.state, KeyState::Usable);
            assert_eq!(completed.stored.partner, "Bob");

            let id = completed.stored.session_id.to_text();
            assert_eq!(session_bytes(&alice, &id), session_bytes(&bob, &id));
            assert_eq!(session_bytes(&alice, &id).len(), width.session_key_len());
            assert!(alice.store().lookup_ecdh_key(request.session_id.random()).unwrap().is_none());
        }
    }

    #[test]
    fn responder_stores_nothing_but_session_key() {
        let mut alice = handshake(1);
        let mut bob = handshake(2);
        let request = alice.initiate(EcdhWidth::W256, "Bob").unwrap();

        bob.process_key_pair(&request.session_id, &request.key_text).unwrap();
        let keys = bob.store().keys().unwrap();
        assert_eq!(keys.len(), 1);
        assert!(matches!(&keys[0], Key::Session(k) if k.state == KeyState::Remote));
    }

    #[test]
    fn orphaned_response_leaves_store_unchanged() {
        let mut alice = handshake(1);
        let mut bob = handshake(2);
        let request = bob.initiate(EcdhWidth::W256, "x").unwrap();
        let mut carol = handshake(3);
        let response = carol
            .process_key_pair(&request.session_id, &request.key_text)
            .unwrap()
            .response
            .unwrap();

        let err = alice.process_key_pair(&response.session_id, &response.key_text).unwrap_err();
        assert_eq!(err, HandshakeError::UnknownSession { session_id: response.session_id });
        assert!(alice.store().is_empty().unwrap());
    }

    #[test]
    fn response_with_wrong_width_is_unknown() {
        let mut alice = handshake(1);
        let request = alice.initiate(EcdhWidth::W256, "Bob").unwrap();

        let wide = SessionId::parse(SessionType::EcdhRes512.symbol(), request.session_id.random())
            .unwrap();
        let contribution = encode(&[0x02; 65]);
        let err = alice.process_key_pair(&wide, &contribution).unwrap_err();
        assert!(matches!(err, HandshakeError::UnknownSession { .. }));
        assert_eq!(alice.store().len().unwrap(), 1);
    }

    #[test]
    fn low_order_point_is_rejected_before_storing() {
        let mut bob = handshake(2);
        let id = SessionId::parse_text("4ABC").unwrap();
        let mut bogus = vec![EcdhWidth::W256.tag()];
        bogus.extend_from_slice(&[0; 32]);

        let err = bob.process_key_pair(&id, &encode(&bogus)).unwrap_err();
        assert!(err.is_format_error());
        assert!(bob.store().is_empty().unwrap());
    }

    #[test]
    fn wrong_length_key_is_format_error() {
        let mut bob = handshake(2);
        let id = SessionId::parse_text("3ABC").unwrap();
        let err = bob.process_key_pair(&id, &encode(&[1; 16])).unwrap_err();
        assert_eq!(
            err,
            HandshakeError::from(CodecError::InvalidLength { expected: 52, actual: 26 })
        );
    }

    #[test]
    fn repeated_pair_overwrites() {
        let mut bob = handshake(2);
        let id = SessionId::parse_text("2ABC").unwrap();
        let text = encode(&[4; 16]);
        bob.process_key_pair(&id, &text).unwrap();
        bob.process_key_pair(&id, &text).unwrap();
        assert_eq!(bob.store().len().unwrap(), 1);
    }

    /// Draws zero-valued correlation tokens while `collisions` is non-zero.
    #[derive(Clone)]
    struct CollidingEnv {
        inner: SeededEnv,
        collisions: Arc<AtomicUsize>,
    }

    impl CollidingEnv {
        fn new(seed: u64, collisions: usize) -> Self {
            Self { inner: SeededEnv::new(seed), collisions: Arc::new(AtomicUsize::new(collisions)) }
        }
    }

    impl Environment for CollidingEnv {
        fn random_bytes(&self, buffer: &mut [u8]) {
            let colliding = buffer.len() == crate::session_id::TOKEN_SYMBOLS
                && self
                    .collisions
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok();
            if colliding {
                buffer.fill(0);
            } else {
                self.inner.random_bytes(buffer);
            }
        }

        fn wall_clock_secs(&self) -> u64 {
            self.inner.wall_clock_secs()
        }
    }

    fn store_with_usable_key(id: &str) -> MemoryKeyStore {
        let mut store = MemoryKeyStore::new();
        store
            .add(Key::Session(SessionKey {
                session_id: SessionId::parse_text(id).unwrap(),
                partner: "Old".into(),
                state: KeyState::Usable,
                key: KeyMaterial::new(vec![0xAA; 16]),
                created_at: 0,
            }))
            .unwrap();
        store
    }

    #[test]
    fn initiate_skips_token_of_stored_session_key() {
        // Token "222" would derive session key "2222"
        let mut alice = Handshake::new(CollidingEnv::new(1, 1), store_with_usable_key("2222"));
        let mut bob = handshake(2);

        let request = alice.initiate(EcdhWidth::W256, "New").unwrap();
        assert_ne!(request.session_id.random(), "222");

        let response = bob
            .process_key_pair(&request.session_id, &request.key_text)
            .unwrap()
            .response
            .unwrap();
        alice.process_key_pair(&response.session_id, &response.key_text).unwrap();

        let Some(Key::Session(old)) = alice.store().get("2222").unwrap() else {
            unreachable!("existing key must survive");
        };
        assert_eq!(old.partner, "Old");
        assert_eq!(old.key.as_bytes(), &[0xAA; 16][..]);
        assert_eq!(alice.store().len().unwrap(), 2);
    }

    #[test]
    fn initiate_gives_up_when_every_token_collides() {
        let env = CollidingEnv::new(1, MAX_TOKEN_ATTEMPTS);
        let mut alice = Handshake::new(env, store_with_usable_key("2222"));

        let err = alice.initiate(EcdhWidth::W256, "New").unwrap_err();
        assert_eq!(err, HandshakeError::TokenExhausted { attempts: MAX_TOKEN_ATTEMPTS });
        assert_eq!(alice.store().len().unwrap(), 1);
    }

    #[test]
    fn repeated_request_gets_same_response() {
        let mut alice = handshake(1);
        let mut bob = handshake(2);
        let request = alice.initiate(EcdhWidth::W512, "Bob").unwrap();

        let first = bob.process_key_pair(&request.session_id, &request.key_text).unwrap();
        // Another payload in between defeats consecutive-duplicate filtering
        bob.process_key_pair(&SessionId::parse_text("2ABC").unwrap(), &encode(&[1; 16]))
            .unwrap();
        let second = bob.process_key_pair(&request.session_id, &request.key_text).unwrap();
        assert_eq!(first, second);

        let response = first.response.unwrap();
        let completed = alice.process_key_pair(&response.session_id, &response.key_text).unwrap();

        let id = completed.stored.session_id.to_text();
        assert_eq!(session_bytes(&alice, &id), session_bytes(&bob, &id));
    }

    #[test]
    fn repeated_request_after_delete_is_answered_afresh() {
        let mut alice = handshake(1);
        let mut bob = handshake(2);
        let request = alice.initiate(EcdhWidth::W256, "Bob").unwrap();

        let first = bob.process_key_pair(&request.session_id, &request.key_text).unwrap();
        assert!(bob.delete(&first.stored.session_id.to_text()).unwrap());

        let second = bob.process_key_pair(&request.session_id, &request.key_text).unwrap();
        assert_ne!(first.response, second.response);
        assert_eq!(bob.store().len().unwrap(), 1);
    }

    #[test]
    fn confirm_and_delete() {
        let mut bob = handshake(2);
        let id = SessionId::parse_text("2ABC").unwrap();
        bob.process_key_pair(&id, &encode(&[4; 16])).unwrap();

        bob.confirm("2ABC").unwrap();
        assert_eq!(bob.store().get("2ABC").unwrap().unwrap().state(), KeyState::Usable);
        assert!(matches!(bob.confirm("2ABC"), Err(HandshakeError::State(_))));
        assert!(matches!(bob.confirm("2XXX"), Err(HandshakeError::KeyNotFound { .. })));

        assert!(bob.delete("2ABC").unwrap());
        assert!(!bob.delete("2ABC").unwrap());
    }

    #[test]
    fn generated_code_renders_blocks() {
        let mut alice = handshake(5);
        let request = alice.initiate(EcdhWidth::W512, "Bob").unwrap();

        let blocks = request.blocks().unwrap();
        assert_eq!(blocks.len(), 1 + 27);
        assert!(blocks.iter().all(|b| b.len() == 5));
        assert_eq!(request.qr_text(), format!("{}:{}", request.session_id, request.key_text));
    }

    #[test]
    fn import_privasphere_record() {
        let mut alice = handshake(1);
        let record = PrivaSphereRecord {
            id: "ps-1".into(),
            partner: "Carol".into(),
            date: "2024-01-01".into(),
            key: KeyMaterial::new(vec![2; 32]),
        };
        assert_eq!(alice.import_privasphere(record).unwrap(), "ps-1");
        assert!(matches!(alice.store().get("ps-1").unwrap(), Some(Key::PrivaSphere(_))));
    }

    struct FailingStore;

    impl KeyStore for FailingStore {
        fn add(&mut self, _key: Key) -> Result<(), StoreError> {
            Err(StoreError::Unavailable { reason: "read-only".into() })
        }
        fn remove(&mut self, _id: &str) -> Result<Option<Key>, StoreError> {
            Ok(None)
        }
        fn lookup_ecdh_key(&self, _token: &str) -> Result<Option<EcdhKey>, StoreError> {
            Ok(None)
        }
        fn get(&self, _id: &str) -> Result<Option<Key>, StoreError> {
            Ok(None)
        }
        fn keys(&self) -> Result<Vec<Key>, StoreError> {
            Ok(Vec::new())
        }
        fn len(&self) -> Result<usize, StoreError> {
            Ok(0)
        }
    }

    #[test]
    fn store_failure_is_fatal() {
        let mut handshake = Handshake::new(SeededEnv::new(0), FailingStore);
        let id = SessionId::parse_text("2ABC").unwrap();
        let err = handshake.process_key_pair(&id, &encode(&[0; 16])).unwrap_err();
        assert!(err.is_fatal());
    }
}

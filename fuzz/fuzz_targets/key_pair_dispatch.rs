//! Fuzz target for key pair dispatch
//!
//! Feeds arbitrary session ids and key text to the handshake, with one
//! outstanding request of each width so responses reach the ECDH path.
//!
//! # Invariants
//!
//! - Dispatch never panics; peer input only produces structured errors
//! - A successful dispatch leaves the key it reports in the store
//! - The store never holds more than one pending request per token

#![no_main]

use arbitrary::Arbitrary;
use glyphkey_codec::encode;
use glyphkey_core::{
    EcdhWidth, Handshake, KeyState, KeyStore, MemoryKeyStore, SessionId, SessionType,
    env::test_utils::SeededEnv,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    seed: u64,
    pairs: Vec<Pair>,
}

#[derive(Debug, Arbitrary)]
struct Pair {
    type_index: u8,
    token: [u8; 3],
    key: KeyText,
}

#[derive(Debug, Arbitrary)]
enum KeyText {
    Bytes(Vec<u8>),
    Raw(String),
}

fuzz_target!(|input: Input| {
    let mut handshake = Handshake::new(SeededEnv::new(input.seed), MemoryKeyStore::new());
    let mut tokens = Vec::new();
    for width in [EcdhWidth::W256, EcdhWidth::W512] {
        if let Ok(request) = handshake.initiate(width, "fuzz") {
            tokens.push(request.session_id.random().to_owned());
        }
    }

    for pair in input.pairs.iter().take(32) {
        let session_type = SessionType::ALL[usize::from(pair.type_index) % SessionType::ALL.len()];
        // Half the time reuse a pending token so responses can match
        let token = if pair.token[0] % 2 == 0 && !tokens.is_empty() {
            tokens[usize::from(pair.token[1]) % tokens.len()].clone()
        } else {
            glyphkey_codec::STANDARD.to_text(&pair.token.map(|b| b & 0x1F))
        };
        let Ok(session_id) = SessionId::parse_text(&format!("{}{token}", session_type.symbol()))
        else {
            continue;
        };

        let key_text = match &pair.key {
            KeyText::Bytes(bytes) => encode(bytes),
            KeyText::Raw(text) => text.clone(),
        };

        if let Ok(outcome) = handshake.process_key_pair(&session_id, &key_text) {
            let stored = handshake.store().get(&outcome.stored.session_id.to_text()).unwrap();
            assert!(stored.is_some());
        }
    }

    let keys = handshake.store().keys().unwrap();
    let mut pending: Vec<&str> = keys
        .iter()
        .filter(|key| key.state() == KeyState::Pending)
        .filter_map(|key| key.session_id().map(SessionId::random))
        .collect();
    let before = pending.len();
    pending.sort_unstable();
    pending.dedup();
    assert_eq!(pending.len(), before);
});

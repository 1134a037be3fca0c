//! Session key derivation using HKDF

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::ecdh::{EcdhWidth, SharedSecret};

/// Label used for session key derivation
const SESSION_KEY_LABEL: &[u8] = b"glyphkeySessionV1";

/// Derive the session key for a completed handshake.
///
/// The output is [`EcdhWidth::session_key_len`] bytes and is bound to the
/// correlation token and both contributions, in request/response order.
/// Initiator and responder call this with identical arguments.
///
/// # Security
///
/// - Different tokens produce different keys for the same exchange
/// - Swapping request and response produces a different key
/// - Deterministic: same inputs always produce same output
pub fn derive_session_key(
    width: EcdhWidth,
    shared: &SharedSecret,
    token: &[u8],
    request: &[u8],
    response: &[u8],
) -> Zeroizing<Vec<u8>> {
    let hkdf = Hkdf::<Sha256>::new(None, shared.as_bytes());

    // label || token || request contribution || response contribution
    let mut info =
        Vec::with_capacity(SESSION_KEY_LABEL.len() + token.len() + request.len() + response.len());
    info.extend_from_slice(SESSION_KEY_LABEL);
    info.extend_from_slice(token);
    info.extend_from_slice(request);
    info.extend_from_slice(response);

    let mut key = Zeroizing::new(vec![0u8; width.session_key_len()]);
    let Ok(()) = hkdf.expand(&info, &mut key) else {
        unreachable!("session key lengths are valid HKDF-SHA256 output lengths");
    };

    key
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ecdh::EphemeralKey;

    fn handshake(width: EcdhWidth) -> (EphemeralKey, EphemeralKey) {
        let request = EphemeralKey::from_seed(width, &vec![0x11; width.seed_len()]).unwrap();
        let response = EphemeralKey::from_seed(width, &vec![0x22; width.seed_len()]).unwrap();
        (request, response)
    }

    #[test]
    fn initiator_and_responder_derive_same_key() {
        for width in [EcdhWidth::W256, EcdhWidth::W512] {
            let (request, response) = handshake(width);

            let at_initiator = derive_session_key(
                width,
                &request.agree(response.contribution()).unwrap(),
                b"K7Q",
                request.contribution(),
                response.contribution(),
            );
            let at_responder = derive_session_key(
                width,
                &response.agree(request.contribution()).unwrap(),
                b"K7Q",
                request.contribution(),
                response.contribution(),
            );

            assert_eq!(at_initiator, at_responder);
            assert_eq!(at_initiator.len(), width.session_key_len());
        }
    }

    #[test]
    fn key_is_bound_to_token() {
        let (request, response) = handshake(EcdhWidth::W256);
        let shared = request.agree(response.contribution()).unwrap();

        let a = derive_session_key(
            EcdhWidth::W256,
            &shared,
            b"AAA",
            request.contribution(),
            response.contribution(),
        );
        let b = derive_session_key(
            EcdhWidth::W256,
            &shared,
            b"AAB",
            request.contribution(),
            response.contribution(),
        );
        assert_ne!(a, b, "different tokens must produce different keys");
    }

    #[test]
    fn key_is_bound_to_contribution_order() {
        let (request, response) = handshake(EcdhWidth::W512);
        let shared = request.agree(response.contribution()).unwrap();

        let forward = derive_session_key(
            EcdhWidth::W512,
            &shared,
            b"T",
            request.contribution(),
            response.contribution(),
        );
        let reversed = derive_session_key(
            EcdhWidth::W512,
            &shared,
            b"T",
            response.contribution(),
            request.contribution(),
        );
        assert_ne!(forward, reversed);
    }
}

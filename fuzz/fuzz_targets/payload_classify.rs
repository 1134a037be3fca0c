//! Fuzz target for QR payload classification
//!
//! # Invariants
//!
//! - Classification is total: every input maps to exactly one format, never
//!   a panic
//! - A recognized standard batch survives format -> classify unchanged
//! - A recognized PrivaSphere record carries a non-empty id and partner

#![no_main]

use glyphkey_core::{Payload, classify_payload, format_standard};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    match classify_payload(text) {
        Payload::Standard(batch) => {
            assert!(!batch.pairs.is_empty());
            let reformatted = format_standard(&batch.pairs);
            match classify_payload(&reformatted) {
                Payload::Standard(again) => {
                    assert_eq!(again.pairs, batch.pairs);
                    assert_eq!(again.rejected, 0);
                },
                other => panic!("reformatted batch classified as {other:?}"),
            }
        },
        Payload::PrivaSphere(record) => {
            assert!(!record.id.is_empty());
            assert!(!record.partner.is_empty());
        },
        Payload::Unrecognized => {},
    }
});

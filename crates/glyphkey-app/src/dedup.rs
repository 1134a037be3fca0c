//! Duplicate scan suppression.
//!
//! A camera sees the same QR code on many consecutive frames. Only a payload
//! that differs from the previous one is dispatched; the handshake layer
//! tolerates repeats anyway, but an ECDH request processed twice would
//! produce two different responses.

use tracing::debug;

/// Suppresses a payload identical to the one before it.
#[derive(Debug, Default)]
pub struct DuplicateFilter {
    last: Option<String>,
    suppressed: usize,
}

impl DuplicateFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `payload` should be processed.
    pub fn admit(&mut self, payload: &str) -> bool {
        let payload = payload.trim();
        if self.last.as_deref() == Some(payload) {
            self.suppressed += 1;
            debug!(suppressed = self.suppressed, "duplicate payload suppressed");
            return false;
        }
        self.last = Some(payload.to_owned());
        true
    }

    /// Forget the previous payload, so the next one is always admitted.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Payloads suppressed so far.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }
}

//! Payload-to-display translation layer.
//!
//! The [`Bridge`] wraps the [`Handshake`] orchestrator and adapts it to the
//! scan lifecycle.
//!
//! # Responsibilities
//!
//! - Drops consecutive duplicate payloads before they reach the handshake
//! - Classifies each payload and dispatches it by format
//! - Converts per-pair results into [`DisplayAction`]s: generated responses
//!   when there are any, otherwise the key list, plus one error report per
//!   failed pair

use glyphkey_core::{
    EcdhWidth, Environment, GeneratedCode, Handshake, HandshakeError, KeyPair, KeyStore, Payload,
    SessionId, StandardBatch, classify_payload,
};
use tracing::debug;

use crate::{DisplayAction, DuplicateFilter, RuntimeConfig};

/// Bridge between scanned text and the handshake orchestrator.
pub struct Bridge<E: Environment, S: KeyStore> {
    handshake: Handshake<E, S>,
    dedup: DuplicateFilter,
}

impl<E: Environment, S: KeyStore> Bridge<E, S> {
    /// Create a bridge over `store`.
    pub fn new(env: E, store: S, config: &RuntimeConfig) -> Self {
        let handshake = Handshake::new(env, store).with_remote_partner(&config.remote_partner);
        Self { handshake, dedup: DuplicateFilter::new() }
    }

    /// Process one decoded payload and return what to display.
    ///
    /// A payload identical to the previous one produces no actions.
    pub fn handle_payload(&mut self, text: &str) -> Vec<DisplayAction> {
        if !self.dedup.admit(text) {
            return vec![];
        }

        match classify_payload(text) {
            Payload::Standard(batch) => self.dispatch(&batch),
            Payload::PrivaSphere(record) => match self.handshake.import_privasphere(record) {
                Ok(id) => vec![DisplayAction::ShowPrivaSphereKey { id }],
                Err(err) => vec![report(None, &err)],
            },
            Payload::Unrecognized => {
                debug!(len = text.len(), "unrecognized payload");
                vec![DisplayAction::ReportError {
                    message: "unrecognized payload".to_owned(),
                    fatal: false,
                }]
            },
        }
    }

    /// Process a pair completed by manual entry.
    pub fn handle_manual(&mut self, session_id: SessionId, key_text: String) -> Vec<DisplayAction> {
        let batch = StandardBatch { pairs: vec![KeyPair { session_id, key_text }], rejected: 0 };
        self.dispatch(&batch)
    }

    /// Start an ECDH request.
    pub fn initiate(
        &mut self,
        width: EcdhWidth,
        partner: &str,
    ) -> Result<GeneratedCode, HandshakeError> {
        self.handshake.initiate(width, partner)
    }

    /// The wrapped orchestrator.
    pub fn handshake(&self) -> &Handshake<E, S> {
        &self.handshake
    }

    /// Duplicate payloads dropped so far.
    pub fn suppressed(&self) -> usize {
        self.dedup.suppressed()
    }

    fn dispatch(&mut self, batch: &StandardBatch) -> Vec<DisplayAction> {
        let report = self.handshake.process_batch(batch);

        let mut actions: Vec<DisplayAction> =
            report.errors().into_iter().map(|(id, err)| self::report(Some(id), err)).collect();

        let responses = report.responses();
        if !responses.is_empty() {
            actions.push(DisplayAction::ShowGeneratedResponses { responses });
        } else {
            let stored: Vec<_> = report.stored().into_iter().cloned().collect();
            if !stored.is_empty() {
                actions.push(DisplayAction::ShowKeyManagement { stored });
            }
        }

        actions
    }
}

fn report(session_id: Option<&SessionId>, err: &HandshakeError) -> DisplayAction {
    let message = match session_id {
        Some(id) => format!("{id}: {err}"),
        None => err.to_string(),
    };
    DisplayAction::ReportError { message, fatal: err.is_fatal() }
}

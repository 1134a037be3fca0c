//! Async scan dispatch loop.
//!
//! A capture task (camera decoder, stdin reader, test harness) pushes decoded
//! payload text into a bounded channel. The [`Runtime`] drains it in order,
//! dispatches each payload through the [`Bridge`] and forwards the resulting
//! actions to a [`Display`].
//!
//! ```text
//! capture task ──mpsc──▶ Runtime ──▶ Bridge ──▶ Handshake ──▶ KeyStore
//!                           │
//!                           └──▶ Display
//! ```
//!
//! Payloads are processed one at a time; store writes never interleave.

use glyphkey_core::{Environment, KeyStore};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{Bridge, CaptureError, Display, DisplayAction, RuntimeConfig, RuntimeError};

/// Sender half handed to a capture task.
pub type CaptureSender = mpsc::Sender<Result<String, CaptureError>>;

/// Receiver half consumed by [`Runtime::run`].
pub type CaptureReceiver = mpsc::Receiver<Result<String, CaptureError>>;

/// Create a bounded capture channel.
pub fn capture_channel(capacity: usize) -> (CaptureSender, CaptureReceiver) {
    mpsc::channel(capacity.max(1))
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Payloads received from the capture source
    pub payloads: usize,
    /// Payloads dropped as consecutive duplicates
    pub duplicates: usize,
    /// Capture failures skipped
    pub capture_errors: usize,
    /// Payloads that stored at least one key
    pub stored_payloads: usize,
    /// Non-fatal error reports shown
    pub reported_errors: usize,
}

/// Scan dispatch loop.
pub struct Runtime<E: Environment, S: KeyStore, D: Display> {
    bridge: Bridge<E, S>,
    display: D,
    config: RuntimeConfig,
}

impl<E: Environment, S: KeyStore, D: Display> Runtime<E, S, D> {
    /// Create a runtime over `store` rendering to `display`.
    pub fn new(env: E, store: S, display: D, config: RuntimeConfig) -> Self {
        let bridge = Bridge::new(env, store, &config);
        Self { bridge, display, config }
    }

    /// The payload bridge, e.g. to initiate a request before scanning.
    pub fn bridge_mut(&mut self) -> &mut Bridge<E, S> {
        &mut self.bridge
    }

    /// The payload bridge.
    pub fn bridge(&self) -> &Bridge<E, S> {
        &self.bridge
    }

    /// The display sink.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// The display sink, for actions raised outside the scan loop.
    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Give back the display sink.
    pub fn into_display(self) -> D {
        self.display
    }

    /// Drain `rx` until the capture side closes.
    ///
    /// Capture failures are logged and skipped. Returns early when a payload
    /// stored a key and `stop_after_first_key` is set, or with an error when a
    /// fatal handshake failure was reported.
    pub async fn run(&mut self, mut rx: CaptureReceiver) -> Result<RunSummary, RuntimeError> {
        let mut summary = RunSummary::default();
        let suppressed_before = self.bridge.suppressed();

        while let Some(item) = rx.recv().await {
            let text = match item {
                Ok(text) => text,
                Err(err) => {
                    warn!(error = %err, "capture failed, skipping frame");
                    summary.capture_errors += 1;
                    continue;
                },
            };
            summary.payloads += 1;

            let actions = self.bridge.handle_payload(&text);
            if actions.is_empty() {
                debug!("no actions for payload");
            }

            let mut stored = false;
            for action in &actions {
                self.display.show(action);
                stored |= action.is_key_stored();
                if let DisplayAction::ReportError { message, fatal } = action {
                    if *fatal {
                        error!(%message, "fatal handshake failure");
                        summary.duplicates = self.bridge.suppressed() - suppressed_before;
                        return Err(RuntimeError::Fatal { message: message.clone(), summary });
                    }
                    summary.reported_errors += 1;
                }
            }

            if stored {
                summary.stored_payloads += 1;
                if self.config.stop_after_first_key {
                    info!("key stored, stopping");
                    break;
                }
            }
        }

        summary.duplicates = self.bridge.suppressed() - suppressed_before;
        Ok(summary)
    }
}

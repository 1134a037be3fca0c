//! Display sinks.
//!
//! Display is fire-and-forget: the runtime hands over an action and never
//! looks at a result. A sink that cannot render logs and moves on.

use std::io::Write;

use glyphkey_core::GeneratedCode;
use tracing::warn;

use crate::DisplayAction;

/// Receives display actions.
pub trait Display {
    /// Render one action.
    fn show(&mut self, action: &DisplayAction);
}

/// Plain-text sink for terminals and pipes.
///
/// Generated codes are printed twice: as QR payload text and as the blocks a
/// user would type.
pub struct TextDisplay<W: Write> {
    out: W,
}

impl<W: Write> TextDisplay<W> {
    /// Write to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, action: &DisplayAction) -> std::io::Result<()> {
        match action {
            DisplayAction::ShowRequest { request } => self.render_code("request", request)?,
            DisplayAction::ShowGeneratedResponses { responses } => {
                for code in responses {
                    self.render_code("response", code)?;
                }
            },
            DisplayAction::ShowKeyManagement { stored } => {
                for key in stored {
                    writeln!(
                        self.out,
                        "stored {} partner={} state={:?}",
                        key.session_id, key.partner, key.state
                    )?;
                }
            },
            DisplayAction::ShowPrivaSphereKey { id } => {
                writeln!(self.out, "imported PrivaSphere key {id}")?;
            },
            DisplayAction::ReportError { message, fatal } => {
                let label = if *fatal { "fatal" } else { "error" };
                writeln!(self.out, "{label}: {message}")?;
            },
        }
        self.out.flush()
    }

    fn render_code(&mut self, label: &str, code: &GeneratedCode) -> std::io::Result<()> {
        writeln!(self.out, "{label} {}", code.session_id)?;
        writeln!(self.out, "  qr:     {}", code.qr_text())?;
        match code.blocks() {
            Ok(blocks) => writeln!(self.out, "  blocks: {}", blocks.join(" ")),
            Err(err) => writeln!(self.out, "  blocks: unavailable ({err})"),
        }
    }
}

impl<W: Write> Display for TextDisplay<W> {
    fn show(&mut self, action: &DisplayAction) {
        if let Err(err) = self.render(action) {
            warn!(error = %err, "display write failed");
        }
    }
}

/// Sink that records every action, for tests and embedding.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    /// Actions in the order they were shown
    pub actions: Vec<DisplayAction>,
}

impl Display for RecordingDisplay {
    fn show(&mut self, action: &DisplayAction) {
        self.actions.push(action.clone());
    }
}

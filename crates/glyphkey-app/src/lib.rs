//! Glyphkey App
//!
//! Async scan runtime and display layer over `glyphkey-core`. A capture source
//! feeds decoded QR payloads into a channel; the [`Runtime`] dispatches each
//! one through the [`Bridge`] and renders the outcome on a [`Display`].
//!
//! The `glyphkey` binary wires this to stdin or a payload file.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod bridge;
mod config;
mod dedup;
mod display;
mod error;
mod runtime;
mod system_env;

pub use action::DisplayAction;
pub use bridge::Bridge;
pub use config::RuntimeConfig;
pub use dedup::DuplicateFilter;
pub use display::{Display, RecordingDisplay, TextDisplay};
pub use error::{CaptureError, RuntimeError};
pub use runtime::{CaptureReceiver, CaptureSender, RunSummary, Runtime, capture_channel};
pub use system_env::SystemEnv;

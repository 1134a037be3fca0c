//! Runtime configuration.

use glyphkey_core::DEFAULT_REMOTE_PARTNER;

/// Settings for the scan dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Capacity of the capture channel. A full channel makes the capture task
    /// wait instead of buffering frames without bound.
    pub channel_capacity: usize,
    /// Stop after the first payload that stored a key
    pub stop_after_first_key: bool,
    /// Partner label for keys received from an unknown peer
    pub remote_partner: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 16,
            stop_after_first_key: false,
            remote_partner: DEFAULT_REMOTE_PARTNER.to_owned(),
        }
    }
}

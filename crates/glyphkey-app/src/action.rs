//! Display actions produced by the bridge.

use glyphkey_core::{GeneratedCode, StoredKey};

/// What the front end should show after a payload was dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayAction {
    /// ECDH request we initiated, for the peer to scan or type
    ShowRequest {
        /// Generated request
        request: GeneratedCode,
    },

    /// ECDH responses to show for the peer to scan or type
    ShowGeneratedResponses {
        /// Responses in payload order
        responses: Vec<GeneratedCode>,
    },

    /// Keys were stored; show the key list
    ShowKeyManagement {
        /// Keys stored by this payload
        stored: Vec<StoredKey>,
    },

    /// A PrivaSphere key was imported
    ShowPrivaSphereKey {
        /// Store identity of the imported key
        id: String,
    },

    /// A payload or pair could not be used
    ReportError {
        /// Human-readable description
        message: String,
        /// True if further processing is pointless
        fatal: bool,
    },
}

impl DisplayAction {
    /// True if the action follows a successful store write.
    pub fn is_key_stored(&self) -> bool {
        matches!(
            self,
            Self::ShowGeneratedResponses { .. }
                | Self::ShowKeyManagement { .. }
                | Self::ShowPrivaSphereKey { .. }
        )
    }

    /// True for a fatal error report.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ReportError { fatal: true, .. })
    }
}

//! Manual code entry.
//!
//! The user first types a selector block (session type plus correlation
//! token), which sizes the block group for the key material, then types the
//! key blocks in any order. [`ManualEntry`] is a plain state object: the
//! caller feeds it every edit and dispatches the pair from
//! [`ManualEntry::completed`] once it appears.

use glyphkey_codec::{Block, BlockGroup, BlockState, GroupState};

use crate::{
    error::{FormatError, ManualEntryError},
    session_id::SessionId,
};

/// Selector block plus a block group sized for the selected session.
#[derive(Debug, Clone, Default)]
pub struct ManualEntry {
    selector: Block,
    session_id: Option<SessionId>,
    group: Option<BlockGroup>,
}

impl ManualEntry {
    /// Empty entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selector block text.
    ///
    /// A valid selector naming a session with a different layout resets the
    /// key blocks. Key blocks survive while the selector is being edited.
    ///
    /// # Errors
    ///
    /// `UnknownSessionType` if the selector checksums correctly but names no
    /// known session type.
    pub fn update_selector(&mut self, text: &str) -> Result<BlockState, FormatError> {
        let state = self.selector.update(text);
        self.session_id = None;

        let Some(values) = self.selector.data() else {
            return Ok(state);
        };
        let session_id = SessionId::from_values(values)?;

        let layout = session_id.required_layout();
        if self.group.as_ref().is_none_or(|group| group.layout() != layout) {
            self.group = Some(BlockGroup::new(layout));
        }
        self.session_id = Some(session_id);
        Ok(state)
    }

    /// Replace the text of key block `index`.
    pub fn update_block(&mut self, index: usize, text: &str) -> Result<GroupState, ManualEntryError> {
        if self.session_id.is_none() {
            return Err(ManualEntryError::NoSession);
        }
        let group = self.group.as_mut().ok_or(ManualEntryError::NoSession)?;
        Ok(group.update(index, text)?)
    }

    /// Selected session, once the selector block is valid.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Number of key blocks to type, once a session is selected.
    pub fn block_count(&self) -> Option<usize> {
        self.session_id.as_ref().map(|id| id.required_layout().blocks)
    }

    /// Key block group, if a session has been selected at some point.
    pub fn group(&self) -> Option<&BlockGroup> {
        self.group.as_ref()
    }

    /// Session ID and key text once everything validates.
    pub fn completed(&self) -> Option<(SessionId, String)> {
        let session_id = self.session_id.as_ref()?;
        let value = self.group.as_ref()?.value().ok()?;
        Some((session_id.clone(), value))
    }

    /// Clear everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

//! Fuzz target for incremental block entry
//!
//! Simulates a user typing, retyping and reordering blocks of a group.
//!
//! # Invariants
//!
//! - `update` never panics; out-of-range indices return an error
//! - The incremental group state always equals the state of a fresh group
//!   fed the same final block texts
//! - `value()` succeeds exactly when the group is valid, and re-encoding the
//!   value reproduces a valid group

#![no_main]

use arbitrary::Arbitrary;
use glyphkey_codec::{BlockGroup, BlockLayout, GroupState};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Entry {
    layout: Layout,
    edits: Vec<Edit>,
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Layout {
    Short,
    Long,
    Ecdh512,
}

impl Layout {
    fn block_layout(self) -> BlockLayout {
        match self {
            Self::Short => BlockLayout::new(7, 2),
            Self::Long => BlockLayout::new(14, 4),
            Self::Ecdh512 => BlockLayout::new(27, 4),
        }
    }
}

#[derive(Debug, Arbitrary)]
struct Edit {
    index: u8,
    text: String,
}

fuzz_target!(|entry: Entry| {
    let layout = entry.layout.block_layout();
    let mut group = BlockGroup::new(layout);
    let mut texts = vec![String::new(); layout.blocks];

    for edit in entry.edits.iter().take(256) {
        let index = usize::from(edit.index);
        match group.update(index, &edit.text) {
            Ok(_) => texts[index] = edit.text.clone(),
            Err(_) => assert!(index >= layout.blocks),
        }
    }

    let mut fresh = BlockGroup::new(layout);
    for (index, text) in texts.iter().enumerate() {
        let _ = fresh.update(index, text);
    }
    assert_eq!(group.state(), fresh.state());

    match group.value() {
        Ok(value) => {
            assert_eq!(group.state(), GroupState::Valid);
            let blocks = BlockGroup::encode(layout, &value).unwrap();
            let mut rebuilt = BlockGroup::new(layout);
            for (index, text) in blocks.iter().enumerate() {
                rebuilt.update(index, text).unwrap();
            }
            assert_eq!(rebuilt.state(), GroupState::Valid);
        },
        Err(_) => assert_ne!(group.state(), GroupState::Valid),
    }
});

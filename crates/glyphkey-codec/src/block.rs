//! Checksummed blocks and block groups for manual transcription.
//!
//! A [`Block`] is a short run of data symbols followed by its own check
//! symbols. A [`BlockGroup`] is a fixed number of blocks whose final data
//! symbols hold an aggregate checksum over everything before them. Block
//! checks catch local typos; the aggregate catches reordered or swapped
//! blocks.
//!
//! # Incremental Validation
//!
//! Both types are explicit state objects driven by `update` calls, one per
//! edit. An update costs O(block length): the group keeps the aggregate
//! weighted sums as a running XOR of per-block contributions, so it never
//! rescans the other blocks.

use crate::{
    alphabet::STANDARD,
    checksum::{compute_checksum, finish, verify, weighted_sum},
    error::CodecError,
};

/// Data symbols per block.
pub const BLOCK_DATA_SYMBOLS: usize = 4;

/// Check symbols per block.
pub const BLOCK_CHECK_SYMBOLS: usize = 1;

/// Symbols typed per block.
pub const BLOCK_SYMBOLS: usize = BLOCK_DATA_SYMBOLS + BLOCK_CHECK_SYMBOLS;

/// Validation state of a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// Nothing entered yet
    Empty,
    /// Some valid symbols entered, block not complete
    Filled,
    /// Complete and checksum matches
    Valid,
    /// Bad symbol, too long, or checksum mismatch
    Invalid,
}

/// A fixed-width block of data symbols plus check symbols.
#[derive(Debug, Clone)]
pub struct Block {
    data_len: usize,
    check_len: usize,
    values: Vec<u8>,
    state: BlockState,
}

impl Block {
    /// Empty block with the standard 4 + 1 layout.
    pub fn new() -> Self {
        Self::with_layout(BLOCK_DATA_SYMBOLS, BLOCK_CHECK_SYMBOLS)
    }

    /// Empty block with a custom layout.
    pub fn with_layout(data_len: usize, check_len: usize) -> Self {
        debug_assert!(data_len > 0 && check_len > 0);
        Self { data_len, check_len, values: Vec::new(), state: BlockState::Empty }
    }

    /// Replace the block content and recompute its validity.
    pub fn update(&mut self, text: &str) -> BlockState {
        self.values.clear();
        self.state = self.evaluate(text);
        if self.state != BlockState::Valid {
            self.values.clear();
        }
        self.state
    }

    fn evaluate(&mut self, text: &str) -> BlockState {
        let width = self.width();
        for c in text.chars() {
            if self.values.len() == width {
                return BlockState::Invalid;
            }
            let Some(value) = STANDARD.value_of(c) else {
                return BlockState::Invalid;
            };
            self.values.push(value);
        }

        match self.values.len() {
            0 => BlockState::Empty,
            n if n < width => BlockState::Filled,
            _ => {
                let (data, check) = self.values.split_at(self.data_len);
                if verify(data, check) { BlockState::Valid } else { BlockState::Invalid }
            },
        }
    }

    /// Current state.
    pub fn state(&self) -> BlockState {
        self.state
    }

    /// True only in [`BlockState::Valid`].
    pub fn is_valid(&self) -> bool {
        self.state == BlockState::Valid
    }

    /// Symbols typed per block (data + check).
    pub fn width(&self) -> usize {
        self.data_len + self.check_len
    }

    /// Validated data symbol values. `None` unless the block is valid.
    pub fn data(&self) -> Option<&[u8]> {
        self.is_valid().then(|| &self.values[..self.data_len])
    }

    /// Render data symbol values as block text with its check symbols.
    pub fn encode(data: &[u8], check_len: usize) -> String {
        let mut values = data.to_vec();
        values.extend(compute_checksum(data, check_len));
        STANDARD.to_text(&values)
    }

    /// Strict decoding of complete block text into its data symbol values.
    ///
    /// Where [`Block::update`] only reports [`BlockState::Invalid`], this
    /// names the first defect.
    pub fn parse(text: &str, data_len: usize, check_len: usize) -> Result<Vec<u8>, CodecError> {
        let mut values = STANDARD.to_values(text)?;
        let expected = data_len + check_len;
        if values.len() != expected {
            return Err(CodecError::InvalidLength { expected, actual: values.len() });
        }

        let check = values.split_off(data_len);
        if !verify(&values, &check) {
            return Err(CodecError::ChecksumMismatch);
        }
        Ok(values)
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}

/// Block count and aggregate checksum size for one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    /// Number of blocks
    pub blocks: usize,
    /// Aggregate checksum symbols at the end of the group data
    pub aggregate: usize,
}

impl BlockLayout {
    /// Create a layout.
    pub const fn new(blocks: usize, aggregate: usize) -> Self {
        Self { blocks, aggregate }
    }

    /// Data symbols across all blocks, aggregate included.
    pub const fn data_symbols(&self) -> usize {
        self.blocks * BLOCK_DATA_SYMBOLS
    }

    /// Payload symbols carried by the group (aggregate excluded).
    pub const fn payload_symbols(&self) -> usize {
        self.data_symbols() - self.aggregate
    }

    /// Symbols a user types for the whole group.
    pub const fn typed_symbols(&self) -> usize {
        self.blocks * BLOCK_SYMBOLS
    }
}

/// Validation state of a block group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    /// At least one block is not valid yet
    Incomplete {
        /// Blocks currently valid
        valid_blocks: usize,
    },
    /// Every block is valid but the aggregate checksum does not match
    AggregateMismatch,
    /// Every block is valid and the aggregate checksum matches
    Valid,
}

/// An ordered set of blocks with a trailing aggregate checksum.
#[derive(Debug, Clone)]
pub struct BlockGroup {
    layout: BlockLayout,
    blocks: Vec<Block>,
    /// Per-block contribution to the aggregate weighted sums.
    contributions: Vec<Option<Vec<u8>>>,
    /// XOR of all present contributions.
    sums: Vec<u8>,
    valid_blocks: usize,
    state: GroupState,
}

impl BlockGroup {
    /// Empty group for `layout`.
    pub fn new(layout: BlockLayout) -> Self {
        debug_assert!(layout.blocks > 0);
        debug_assert!(layout.aggregate < layout.data_symbols());

        Self {
            layout,
            blocks: vec![Block::new(); layout.blocks],
            contributions: vec![None; layout.blocks],
            sums: vec![0; layout.aggregate],
            valid_blocks: 0,
            state: GroupState::Incomplete { valid_blocks: 0 },
        }
    }

    /// Layout this group was sized for.
    pub fn layout(&self) -> BlockLayout {
        self.layout
    }

    /// Replace the text of block `index` and recompute group validity.
    pub fn update(&mut self, index: usize, text: &str) -> Result<GroupState, CodecError> {
        let count = self.blocks.len();
        if index >= count {
            return Err(CodecError::BlockIndexOutOfRange { index, count });
        }

        if let Some(old) = self.contributions[index].take() {
            xor_into(&mut self.sums, &old);
            self.valid_blocks -= 1;
        }

        self.blocks[index].update(text);
        if let Some(data) = self.blocks[index].data() {
            let contribution = contribution(self.layout, index, data);
            xor_into(&mut self.sums, &contribution);
            self.contributions[index] = Some(contribution);
            self.valid_blocks += 1;
        }

        self.state = self.evaluate();
        Ok(self.state)
    }

    fn evaluate(&self) -> GroupState {
        if self.valid_blocks < self.blocks.len() {
            return GroupState::Incomplete { valid_blocks: self.valid_blocks };
        }

        let payload = self.layout.payload_symbols();
        for (j, &sum) in self.sums.iter().enumerate() {
            let expected = finish(sum, payload, j);
            if self.data_value(payload + j) != Some(expected) {
                return GroupState::AggregateMismatch;
            }
        }

        GroupState::Valid
    }

    /// Data symbol at group position `position`, if its block is valid.
    fn data_value(&self, position: usize) -> Option<u8> {
        let block = self.blocks.get(position / BLOCK_DATA_SYMBOLS)?;
        block.data().map(|data| data[position % BLOCK_DATA_SYMBOLS])
    }

    /// Current state.
    pub fn state(&self) -> GroupState {
        self.state
    }

    /// True only if every block is valid and the aggregate matches.
    pub fn are_valid(&self) -> bool {
        self.state == GroupState::Valid
    }

    /// Block at `index`.
    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Payload symbols (aggregate stripped) as canonical text.
    ///
    /// # Errors
    ///
    /// `CodecError::GroupNotValid` unless the group is fully valid.
    pub fn value(&self) -> Result<String, CodecError> {
        if !self.are_valid() {
            return Err(CodecError::GroupNotValid {
                valid_blocks: self.valid_blocks,
                total_blocks: self.blocks.len(),
            });
        }

        let values: Vec<u8> =
            self.blocks.iter().filter_map(Block::data).flatten().copied().collect();
        Ok(STANDARD.to_text(&values[..self.layout.payload_symbols()]))
    }

    /// Render payload text as typed block texts for `layout`.
    pub fn encode(layout: BlockLayout, payload: &str) -> Result<Vec<String>, CodecError> {
        let mut values = STANDARD.to_values(payload)?;
        if values.len() != layout.payload_symbols() {
            return Err(CodecError::InvalidLength {
                expected: layout.payload_symbols(),
                actual: values.len(),
            });
        }

        values.extend(compute_checksum(&values, layout.aggregate));
        debug_assert_eq!(values.len(), layout.data_symbols());

        Ok(values
            .chunks(BLOCK_DATA_SYMBOLS)
            .map(|chunk| Block::encode(chunk, BLOCK_CHECK_SYMBOLS))
            .collect())
    }
}

/// Contribution of one block's data to the aggregate sums. Only the payload
/// part counts; the aggregate symbols are compared, not summed.
fn contribution(layout: BlockLayout, index: usize, data: &[u8]) -> Vec<u8> {
    let offset = index * BLOCK_DATA_SYMBOLS;
    let end = (offset + data.len()).min(layout.payload_symbols());
    let in_payload = if offset < end { &data[..end - offset] } else { &[][..] };

    (0..layout.aggregate).map(|j| weighted_sum(in_payload, offset, j)).collect()
}

fn xor_into(target: &mut [u8], other: &[u8]) {
    for (t, o) in target.iter_mut().zip(other) {
        *t ^= o;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_names_the_defect() {
        let text = Block::encode(&[1, 2, 3, 4], BLOCK_CHECK_SYMBOLS);
        assert_eq!(
            Block::parse(&text, BLOCK_DATA_SYMBOLS, BLOCK_CHECK_SYMBOLS).unwrap(),
            vec![1, 2, 3, 4]
        );

        let mut corrupted: Vec<char> = text.chars().collect();
        corrupted[0] = if corrupted[0] == '2' { '3' } else { '2' };
        let corrupted: String = corrupted.into_iter().collect();
        assert_eq!(
            Block::parse(&corrupted, BLOCK_DATA_SYMBOLS, BLOCK_CHECK_SYMBOLS),
            Err(CodecError::ChecksumMismatch)
        );

        assert_eq!(
            Block::parse(&text[..4], BLOCK_DATA_SYMBOLS, BLOCK_CHECK_SYMBOLS),
            Err(CodecError::InvalidLength { expected: 5, actual: 4 })
        );
        assert!(matches!(
            Block::parse("2345O", BLOCK_DATA_SYMBOLS, BLOCK_CHECK_SYMBOLS),
            Err(CodecError::InvalidSymbol { symbol: 'O', position: 4 })
        ));
    }

    const LAYOUT_128: BlockLayout = BlockLayout::new(7, 2);

    fn payload(len: usize) -> String {
        let values: Vec<u8> = (0..len).map(|i| ((i * 7 + 3) % 32) as u8).collect();
        STANDARD.to_text(&values)
    }

    fn filled_group(layout: BlockLayout, blocks: &[String]) -> BlockGroup {
        let mut group = BlockGroup::new(layout);
        for (i, text) in blocks.iter().enumerate() {
            group.update(i, text).unwrap();
        }
        group
    }

    #[test]
    fn block_state_progression() {
        let text = Block::encode(&[1, 2, 3, 4], 1);
        let mut block = Block::new();

        assert_eq!(block.state(), BlockState::Empty);
        assert_eq!(block.update(&text[..2]), BlockState::Filled);
        assert_eq!(block.update(&text), BlockState::Valid);
        assert_eq!(block.data(), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(block.update(""), BlockState::Empty);
    }

    #[test]
    fn block_rejects_bad_symbol_and_overlong_input() {
        let mut block = Block::new();
        assert_eq!(block.update("AB1"), BlockState::Invalid);

        let text = Block::encode(&[1, 2, 3, 4], 1);
        assert_eq!(block.update(&format!("{text}2")), BlockState::Invalid);
        assert!(block.data().is_none());
    }

    #[test]
    fn block_accepts_lower_case() {
        let text = Block::encode(&[10, 20, 30, 31], 1).to_lowercase();
        let mut block = Block::new();
        assert_eq!(block.update(&text), BlockState::Valid);
    }

    #[test]
    fn single_substitution_invalidates_block() {
        let text = Block::encode(&[5, 6, 7, 8], 1);
        let mut block = Block::new();
        assert!(block.update(&text) == BlockState::Valid);

        for position in 0..BLOCK_SYMBOLS {
            for value in 0..32u8 {
                let mut chars: Vec<char> = text.chars().collect();
                let replacement = STANDARD.symbol(value);
                if chars[position] == replacement {
                    continue;
                }
                chars[position] = replacement;
                let corrupted: String = chars.into_iter().collect();
                assert_eq!(block.update(&corrupted), BlockState::Invalid);
            }
        }
    }

    #[test]
    fn encoded_group_is_valid() {
        let data = payload(LAYOUT_128.payload_symbols());
        let blocks = BlockGroup::encode(LAYOUT_128, &data).unwrap();
        assert_eq!(blocks.len(), 7);

        let group = filled_group(LAYOUT_128, &blocks);
        assert!(group.are_valid());
        assert_eq!(group.value().unwrap(), data);
    }

    #[test]
    fn value_before_valid_is_contract_violation() {
        let group = BlockGroup::new(LAYOUT_128);
        assert_eq!(
            group.value(),
            Err(CodecError::GroupNotValid { valid_blocks: 0, total_blocks: 7 })
        );
    }

    #[test]
    fn swapped_blocks_fail_aggregate() {
        let data = payload(LAYOUT_128.payload_symbols());
        let mut blocks = BlockGroup::encode(LAYOUT_128, &data).unwrap();
        blocks.swap(0, 1);

        let group = filled_group(LAYOUT_128, &blocks);
        assert_eq!(group.state(), GroupState::AggregateMismatch);
        assert!(group.value().is_err());
    }

    #[test]
    fn editing_a_block_revalidates_group() {
        let data = payload(LAYOUT_128.payload_symbols());
        let blocks = BlockGroup::encode(LAYOUT_128, &data).unwrap();
        let mut group = filled_group(LAYOUT_128, &blocks);
        assert!(group.are_valid());

        assert_eq!(group.update(3, "").unwrap(), GroupState::Incomplete { valid_blocks: 6 });
        assert_eq!(group.update(3, &blocks[3]).unwrap(), GroupState::Valid);
    }

    #[test]
    fn update_out_of_range_is_rejected() {
        let mut group = BlockGroup::new(LAYOUT_128);
        assert_eq!(
            group.update(7, "22222"),
            Err(CodecError::BlockIndexOutOfRange { index: 7, count: 7 })
        );
    }

    #[test]
    fn encode_rejects_wrong_payload_length() {
        assert_eq!(
            BlockGroup::encode(LAYOUT_128, "2345"),
            Err(CodecError::InvalidLength { expected: 26, actual: 4 })
        );
    }

    #[test]
    fn layout_symbol_counts() {
        assert_eq!(LAYOUT_128.data_symbols(), 28);
        assert_eq!(LAYOUT_128.payload_symbols(), 26);
        assert_eq!(LAYOUT_128.typed_symbols(), 35);
    }
}

//! Property-based tests for the symbol codec and checksums.
//!
//! These cover the transcription guarantees: lossless round trips, and
//! certain detection of single substitutions and adjacent transpositions.

use glyphkey_codec::{
    BLOCK_DATA_SYMBOLS, Block, BlockGroup, BlockLayout, GroupState, STANDARD, compute_checksum,
    decode, encode,
};
use proptest::prelude::*;

fn layouts() -> impl Strategy<Value = BlockLayout> {
    prop_oneof![
        Just(BlockLayout::new(7, 2)),
        Just(BlockLayout::new(14, 4)),
        Just(BlockLayout::new(14, 3)),
        Just(BlockLayout::new(27, 4)),
    ]
}

fn layout_with_payload() -> impl Strategy<Value = (BlockLayout, Vec<u8>)> {
    layouts().prop_flat_map(|layout| {
        (Just(layout), prop::collection::vec(0u8..32, layout.payload_symbols()))
    })
}

proptest! {
    #[test]
    fn prop_decode_inverts_encode(bytes in prop::collection::vec(any::<u8>(), 0..80)) {
        prop_assert_eq!(decode(&encode(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn prop_decode_is_case_insensitive(bytes in prop::collection::vec(any::<u8>(), 0..40)) {
        let lower = encode(&bytes).to_lowercase();
        prop_assert_eq!(decode(&lower).unwrap(), bytes);
    }

    #[test]
    fn prop_checksum_detects_substitution(
        data in prop::collection::vec(0u8..32, 1..40),
        position in any::<prop::sample::Index>(),
        delta in 1u8..32,
        len in 1usize..5,
    ) {
        let check = compute_checksum(&data, len);
        let i = position.index(data.len());
        let mut corrupted = data.clone();
        corrupted[i] ^= delta;
        prop_assert_ne!(compute_checksum(&corrupted, len), check);
    }

    #[test]
    fn prop_checksum_detects_adjacent_transposition(
        data in prop::collection::vec(0u8..32, 2..40),
        position in any::<prop::sample::Index>(),
    ) {
        let i = position.index(data.len() - 1);
        prop_assume!(data[i] != data[i + 1]);

        let mut swapped = data.clone();
        swapped.swap(i, i + 1);
        prop_assert_ne!(compute_checksum(&swapped, 1), compute_checksum(&data, 1));
    }

    #[test]
    fn prop_checksum_is_idempotent(data in prop::collection::vec(0u8..32, 0..40)) {
        let first = compute_checksum(&data, 4);
        for _ in 0..3 {
            prop_assert_eq!(&compute_checksum(&data, 4), &first);
        }
    }

    #[test]
    fn prop_encoded_group_validates((layout, values) in layout_with_payload()) {
        let payload = STANDARD.to_text(&values);
        let blocks = BlockGroup::encode(layout, &payload).unwrap();

        let mut group = BlockGroup::new(layout);
        for (i, text) in blocks.iter().enumerate() {
            group.update(i, text).unwrap();
        }

        prop_assert!(group.are_valid());
        prop_assert_eq!(group.value().unwrap(), payload);
    }

    #[test]
    fn prop_fill_order_does_not_matter((layout, values) in layout_with_payload(), seed in any::<u64>()) {
        let payload = STANDARD.to_text(&values);
        let blocks = BlockGroup::encode(layout, &payload).unwrap();

        let mut order: Vec<usize> = (0..blocks.len()).collect();
        let mut state = seed;
        for i in (1..order.len()).rev() {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            order.swap(i, (state >> 33) as usize % (i + 1));
        }

        let mut group = BlockGroup::new(layout);
        for &i in &order {
            group.update(i, &blocks[i]).unwrap();
        }
        prop_assert_eq!(group.state(), GroupState::Valid);
    }

    #[test]
    fn prop_wrong_aggregate_is_rejected((layout, values) in layout_with_payload(), delta in 1u8..32) {
        let mut data = values.clone();
        data.extend(compute_checksum(&values, layout.aggregate));

        // Corrupt the last aggregate symbol, then re-checksum its block so
        // every block is individually valid.
        let last = data.len() - 1;
        data[last] ^= delta;
        let blocks: Vec<String> =
            data.chunks(BLOCK_DATA_SYMBOLS).map(|chunk| Block::encode(chunk, 1)).collect();

        let mut group = BlockGroup::new(layout);
        for (i, text) in blocks.iter().enumerate() {
            group.update(i, text).unwrap();
        }

        prop_assert!((0..layout.blocks).all(|i| group.block(i).is_some_and(Block::is_valid)));
        prop_assert_eq!(group.state(), GroupState::AggregateMismatch);
        prop_assert!(!group.are_valid());
        prop_assert!(group.value().is_err());
    }
}

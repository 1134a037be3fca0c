//! Duplicate filter properties.
//!
//! A scan stream is modelled as runs of identical payloads. The filter must
//! admit exactly the first payload of each run.

use glyphkey_app::DuplicateFilter;
use proptest::prelude::*;

fn runs() -> impl Strategy<Value = Vec<(String, usize)>> {
    prop::collection::vec(("[2-9A-Z]{1,6}", 1usize..5), 0..20)
}

proptest! {
    #[test]
    fn admits_one_payload_per_run(runs in runs()) {
        let mut filter = DuplicateFilter::new();
        let mut admitted = Vec::new();
        let mut total = 0;

        for (payload, count) in &runs {
            for _ in 0..*count {
                total += 1;
                if filter.admit(payload) {
                    admitted.push(payload.clone());
                }
            }
        }

        let mut expected: Vec<String> = runs.iter().map(|(p, _)| p.clone()).collect();
        expected.dedup();
        prop_assert_eq!(filter.suppressed(), total - expected.len());
        prop_assert_eq!(admitted, expected);
    }

    #[test]
    fn surrounding_whitespace_is_ignored(payload in "[2-9A-Z]{1,6}", pad in "[ \t\r\n]{0,3}") {
        let mut filter = DuplicateFilter::new();
        prop_assert!(filter.admit(&payload));
        let padded = format!("{pad}{payload}{pad}");
        prop_assert!(!filter.admit(&padded));
    }
}

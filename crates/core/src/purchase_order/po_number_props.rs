//! Property-based tests for PO number allocation.

use proptest::prelude::*;
use std::collections::BTreeSet;

use crate::purchase_order::po_number::{
    MAX_CHILD_SUFFIX, PoNumber, child_suffix, format_parent, next_child_number,
    next_parent_number, parent_sequence,
};

fn arb_prefix() -> impl Strategy<Value = String> {
    (0u32..100, 1u32..=12).prop_map(|(y, m)| format!("{y:02}{m:02}"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The allocated parent is unused, well-formed and smaller than every gap after it.
    #[test]
    fn prop_parent_is_smallest_unused(
        prefix in arb_prefix(),
        used in prop::collection::btree_set(1u32..200, 0..60),
    ) {
        let existing: Vec<String> = used.iter().map(|n| format_parent(&prefix, *n)).collect();
        let number = next_parent_number(&prefix, &existing).unwrap();
        let seq = parent_sequence(&prefix, &number).unwrap();

        prop_assert!(!used.contains(&seq));
        prop_assert!((1..seq).all(|n| used.contains(&n)));
        let is_parent = matches!(PoNumber::parse(&number), Some(PoNumber::Parent { .. }));
        prop_assert!(is_parent);
    }

    /// Children always extend the current maximum suffix.
    #[test]
    fn prop_child_follows_max(
        seq in 1u32..6000,
        suffixes in prop::collection::btree_set(1u32..MAX_CHILD_SUFFIX, 0..20),
    ) {
        let parent = format_parent("2603", seq);
        let existing: Vec<String> = suffixes
            .iter()
            .map(|s| format!("{parent}-{s:02}"))
            .collect();
        let number = next_child_number(&parent, &existing).unwrap();
        let suffix = child_suffix(&parent, &number).unwrap();

        let max = suffixes.iter().max().copied().unwrap_or(0);
        prop_assert_eq!(suffix, max + 1);
        prop_assert!(number.starts_with(&parent));
        prop_assert!(PoNumber::parse(&number).unwrap().is_child());
    }

    /// Allocating repeatedly never produces a duplicate.
    #[test]
    fn prop_sequential_allocation_unique(prefix in arb_prefix(), rounds in 1usize..40) {
        let mut existing = Vec::new();
        let mut seen = BTreeSet::new();
        for _ in 0..rounds {
            let number = next_parent_number(&prefix, &existing).unwrap();
            prop_assert!(seen.insert(number.clone()));
            existing.push(number);
        }
        prop_assert_eq!(seen.len(), rounds);
    }
}

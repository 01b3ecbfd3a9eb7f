//! Property tests for array diffing

use proptest::prelude::*;
use tandem_common::{diff_array, diff_keyed, ArrayChange, Similarity};
use std::collections::BTreeMap;

/// Items with the same "kind" (value mod 4) are compatible, identical items are equal
fn compare(a: &u8, b: &u8) -> Similarity {
    if a == b {
        Similarity::Equal
    } else if a % 4 == b % 4 {
        Similarity::Compatible
    } else {
        Similarity::Incompatible
    }
}

proptest! {
    #[test]
    fn replaying_script_yields_new_sequence(
        old in prop::collection::vec(0u8..12, 0..12),
        new in prop::collection::vec(0u8..12, 0..12),
    ) {
        let diff = diff_array(&old, &new, compare);
        let mut target = old.clone();
        diff.patch(&mut target);
        prop_assert_eq!(target, new);
    }

    #[test]
    fn identical_sequences_have_empty_script(items in prop::collection::vec(0u8..12, 0..12)) {
        let diff = diff_array(&items, &items, compare);
        prop_assert!(diff.is_empty());
    }

    #[test]
    fn removes_precede_inserts_and_updates(
        old in prop::collection::vec(0u8..12, 0..10),
        new in prop::collection::vec(0u8..12, 0..10),
    ) {
        let diff = diff_array(&old, &new, compare);
        let first_other = diff
            .iter()
            .position(|change| !matches!(change, ArrayChange::Remove(_)))
            .unwrap_or(diff.len());
        prop_assert!(diff.iter().skip(first_other).all(|change| !matches!(change, ArrayChange::Remove(_))));

        let removed: Vec<usize> = diff.removes().map(|r| r.index).collect();
        prop_assert!(removed.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn keyed_diff_apply_yields_new_map(
        old in prop::collection::btree_map("[a-e]", "[xyz]{0,2}", 0..5),
        new in prop::collection::btree_map("[a-e]", "[xyz]{0,2}", 0..5),
    ) {
        let old: BTreeMap<String, String> = old;
        let mut target = old.clone();
        diff_keyed(&old, &new).apply(&mut target);
        prop_assert_eq!(target, new);
    }
}

//! Property-based tests for index removal.
//!
//! Run with: cargo test -p mimic-body -- proptest

use mimic_body::remove_by_indices;
use proptest::prelude::*;

/// Values paired with a set of distinct in-range indices to remove.
fn arb_values_and_indices() -> impl Strategy<Value = (Vec<i64>, Vec<usize>)> {
    prop::collection::vec(any::<i64>(), 0..40).prop_flat_map(|values| {
        let len = values.len();
        let indices = prop::sample::subsequence((0..len).collect::<Vec<_>>(), 0..=len);
        (Just(values), indices)
    })
}

proptest! {
    /// Removing k distinct in-range indices shrinks the vector by exactly k.
    #[test]
    fn length_shrinks_by_index_count((values, indices) in arb_values_and_indices()) {
        let kept = remove_by_indices(&values, &indices);
        prop_assert_eq!(kept.len(), values.len() - indices.len());
    }

    /// Remaining entries keep their relative order.
    #[test]
    fn order_is_preserved((values, indices) in arb_values_and_indices()) {
        let kept = remove_by_indices(&values, &indices);
        let expected: Vec<i64> = values
            .iter()
            .enumerate()
            .filter(|(i, _)| !indices.contains(i))
            .map(|(_, v)| *v)
            .collect();
        prop_assert_eq!(kept, expected);
    }

    /// The input is never modified.
    #[test]
    fn input_untouched((values, indices) in arb_values_and_indices()) {
        let before = values.clone();
        let _ = remove_by_indices(&values, &indices);
        prop_assert_eq!(values, before);
    }
}

//! Property-based tests for the assignment engine
//!
//! Invariants under test:
//! - Buckets always land in [1, 100]
//! - Selection is deterministic and total (never an undefined variant)
//! - Zero-weight variants are unreachable
//! - When weights sum to 100, bucket ownership equals weight exactly

use proptest::prelude::*;
use sorteo::engine::{bucket_for, select_variant, variant_for_bucket, BUCKET_COUNT};
use sorteo::registry::{ExperimentDefinition, Variant};

// ============================================================================
// Strategies
// ============================================================================

/// Weight vectors with 1..=6 entries, at least one positive.
fn arb_weights() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(0u32..=200, 1..=6)
        .prop_filter("at least one positive weight", |w| w.iter().any(|&x| x > 0))
}

/// Weight vectors summing to exactly 100, built from cut points.
fn arb_weights_summing_100() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::btree_set(1u32..100, 0..=4).prop_map(|cuts| {
        let mut weights = Vec::new();
        let mut previous = 0;
        for cut in cuts {
            weights.push(cut - previous);
            previous = cut;
        }
        weights.push(100 - previous);
        weights
    })
}

fn definition_from(weights: &[u32]) -> ExperimentDefinition {
    let mut builder = ExperimentDefinition::builder("prop_exp");
    for (i, weight) in weights.iter().enumerate() {
        builder = builder.variant(format!("variant_{i}"), *weight);
    }
    builder.build().expect("at least one positive weight")
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: buckets are always in [1, 100]
    #[test]
    fn prop_bucket_in_range(visitor in ".*", experiment in ".*") {
        let bucket = bucket_for(&visitor, &experiment);
        prop_assert!(bucket >= 1 && bucket <= BUCKET_COUNT);
    }

    /// Property: selection is deterministic
    #[test]
    fn prop_selection_deterministic(visitor in ".*", weights in arb_weights()) {
        let def = definition_from(&weights);
        prop_assert_eq!(select_variant(&def, &visitor), select_variant(&def, &visitor));
    }

    /// Property: selection is total and returns a declared variant
    #[test]
    fn prop_selection_returns_declared_variant(
        visitor in ".*",
        weights in arb_weights()
    ) {
        let def = definition_from(&weights);
        let selected = select_variant(&def, &visitor);
        let keys: Vec<&str> = def.variants().iter().map(Variant::key).collect();
        prop_assert!(keys.contains(&selected));
    }

    /// Property: a selected variant has positive weight unless the
    /// cumulative total fell short of the bucket (first-variant fallback)
    #[test]
    fn prop_zero_weight_only_via_fallback(
        bucket in 1u32..=100,
        weights in arb_weights()
    ) {
        let def = definition_from(&weights);
        let selected = variant_for_bucket(&def, bucket);
        let total: u32 = weights.iter().sum();
        if bucket <= total {
            let weight = def
                .variants()
                .iter()
                .find(|v| v.key() == selected)
                .map(Variant::weight)
                .unwrap_or(0);
            prop_assert!(weight > 0, "zero-weight variant {selected} selected");
        } else {
            prop_assert_eq!(selected, def.first_variant_key());
        }
    }

    /// Property: with weights summing to 100, each variant owns exactly
    /// `weight` of the 100 buckets
    #[test]
    fn prop_bucket_ownership_equals_weight(weights in arb_weights_summing_100()) {
        let def = definition_from(&weights);
        let mut counts = vec![0u32; weights.len()];
        for bucket in 1..=100 {
            let selected = variant_for_bucket(&def, bucket);
            let index = def
                .variants()
                .iter()
                .position(|v| v.key() == selected)
                .expect("declared variant");
            counts[index] += 1;
        }
        prop_assert_eq!(counts, weights);
    }
}

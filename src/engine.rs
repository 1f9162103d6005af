//! Assignment Engine - deterministic variant selection
//!
//! The engine maps `(visitor identity, experiment)` to a variant with no
//! stored random seed: repeatability is derivable purely from the identity,
//! the experiment name, and the definition, which keeps assignment auditable
//! and trivially testable.
//!
//! Pipeline:
//!
//! ```text
//! hash(identity + name)  ->  bucket in [1, 100]  ->  cumulative weight scan
//! ```
//!
//! Hashing the *concatenation* rather than the identity alone decorrelates
//! buckets across experiments: one visitor lands in independent buckets for
//! each experiment they encounter.

use crate::registry::ExperimentDefinition;

/// Number of buckets visitors are mapped into.
pub const BUCKET_COUNT: u32 = 100;

/// Deterministic 32-bit rolling hash of a string.
///
/// `acc = acc * 31 + code_unit` over the UTF-16 code units of the input,
/// with wrapping u32 arithmetic. The unsigned result is already in absolute
/// form. The multiplier 31 gives an order-sensitive hash: `"ab"` and `"ba"`
/// land in different buckets.
#[must_use]
pub fn hash_identity(input: &str) -> u32 {
    input
        .encode_utf16()
        .fold(0u32, |acc, unit| acc.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

/// Map a visitor/experiment pair to a bucket in `1..=100`.
#[must_use]
pub fn bucket_for(visitor_identity: &str, experiment_name: &str) -> u32 {
    let combined = format!("{visitor_identity}{experiment_name}");
    hash_identity(&combined) % BUCKET_COUNT + 1
}

/// Select the variant owning a given bucket.
///
/// Variants are scanned in declaration order, accumulating weights; the
/// first variant whose cumulative weight reaches the bucket wins. A variant
/// with weight `w` therefore owns exactly `w` of the 100 buckets when
/// weights sum to 100. Zero-weight variants own no buckets and are
/// unreachable.
///
/// If the cumulative total never reaches the bucket (weights summing below
/// 100), the first declared variant is returned: the engine never fails and
/// never returns an undefined variant.
#[must_use]
pub fn variant_for_bucket<'a>(definition: &'a ExperimentDefinition, bucket: u32) -> &'a str {
    let mut cumulative = 0u32;
    for variant in definition.variants() {
        cumulative = cumulative.saturating_add(variant.weight());
        if cumulative >= bucket {
            return variant.key();
        }
    }
    definition.first_variant_key()
}

/// Deterministically select a variant for a visitor.
///
/// Repeated calls with the same inputs always return the same variant.
#[must_use]
pub fn select_variant<'a>(
    definition: &'a ExperimentDefinition,
    visitor_identity: &str,
) -> &'a str {
    let bucket = bucket_for(visitor_identity, definition.name());
    variant_for_bucket(definition, bucket)
}

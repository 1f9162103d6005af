//! # Sorteo: Deterministic A/B Experiment Assignment
//!
//! Sorteo buckets anonymous visitors into experiment variants with a
//! deterministic weighted hash, persists the assignment so the visitor sees
//! a stable experience across sessions, and attributes later conversions
//! back to the assigned variant.
//!
//! ## Design Principles
//!
//! - **No stored seed**: assignment is a pure function of
//!   (visitor identity, experiment name, definition), so it is reproducible
//!   and auditable without coordination.
//! - **Never crash the page**: unknown and misconfigured experiments
//!   collapse to the `control` sentinel; storage and analytics failures
//!   degrade, they do not propagate.
//! - **Explicit seams**: storage, analytics, and audience evaluation are
//!   traits injected at construction - no ambient singletons.
//!
//! ## Example Usage
//!
//! ```rust
//! use sorteo::registry::ExperimentDefinition;
//! use sorteo::ExperimentContext;
//!
//! # fn main() -> sorteo::Result<()> {
//! let context = ExperimentContext::builder()
//!     .experiment(
//!         ExperimentDefinition::builder("homepage_hero_cta")
//!             .variant("control", 50)
//!             .variant("variant_a", 25)
//!             .variant("variant_b", 25)
//!             .build()?,
//!     )
//!     .build();
//!
//! // Stable across calls and sessions (with a durable store)
//! let variant = context.get_variant("homepage_hero_cta");
//! assert_eq!(context.get_variant("homepage_hero_cta"), variant);
//!
//! // Later, attribute a conversion to that variant
//! context.track_conversion("homepage_hero_cta", "cta_click", None);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod context;
pub mod engine;
pub mod error;
pub mod identity;
pub mod registry;
pub mod report;
pub mod store;

pub use context::{
    AllowAllAudience, AudienceResolver, ExperimentContext, ExperimentContextBuilder,
    CONTROL_VARIANT,
};
pub use error::{Error, Result};

//! Experiment Registry - the static, ordered set of experiment definitions
//!
//! The registry is supplied once at context construction; there is no live
//! reload. Changing definitions means rebuilding the context.
//!
//! ## Usage
//!
//! ```rust
//! use sorteo::registry::{ExperimentDefinition, ExperimentRegistry};
//!
//! # fn main() -> sorteo::Result<()> {
//! let registry = ExperimentRegistry::new(vec![
//!     ExperimentDefinition::builder("homepage_hero_cta")
//!         .variant("control", 50)
//!         .variant("variant_a", 25)
//!         .variant("variant_b", 25)
//!         .build()?,
//! ]);
//!
//! assert!(registry.get("homepage_hero_cta").is_some());
//! assert!(!registry.is_eligible("nonexistent", chrono::Utc::now()));
//! # Ok(())
//! # }
//! ```

mod definition;

pub use definition::{ExperimentDefinition, ExperimentDefinitionBuilder, Variant};

use chrono::{DateTime, Utc};

/// Holds the experiment definitions and answers eligibility queries.
///
/// Lookups are linear over the definition list; marketing sites run a
/// handful of experiments at a time, so an index would buy nothing.
#[derive(Debug, Default)]
pub struct ExperimentRegistry {
    experiments: Vec<ExperimentDefinition>,
}

impl ExperimentRegistry {
    /// Create a registry from an ordered list of definitions.
    ///
    /// Later duplicates of a name are shadowed by the first occurrence.
    #[must_use]
    pub fn new(experiments: Vec<ExperimentDefinition>) -> Self {
        Self { experiments }
    }

    /// Get the number of registered experiments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    /// Check if the registry holds no experiments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    /// Look up a definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ExperimentDefinition> {
        self.experiments.iter().find(|e| e.name() == name)
    }

    /// Whether the named experiment may assign new visitors at `now`.
    ///
    /// Returns `false` for unknown experiments.
    #[must_use]
    pub fn is_eligible(&self, name: &str, now: DateTime<Utc>) -> bool {
        self.get(name).is_some_and(|e| e.is_eligible_at(now))
    }
}

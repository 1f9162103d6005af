//! Experiment Context - the façade presentation code talks to
//!
//! Composes the registry, assignment store, identity provider, and reporter
//! behind three operations: `get_variant`, `is_test_active`, and
//! `track_conversion`. All collaborators are injected at construction - no
//! ambient singletons - and the context is built once per application
//! session.
//!
//! Nothing here throws: unknown and ineligible experiments degrade to the
//! `control` sentinel so a page always has something to render, and a
//! misconfigured experiment can never crash the page showing it.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::engine;
use crate::identity::IdentityProvider;
use crate::registry::{ExperimentDefinition, ExperimentRegistry};
use crate::report::{AnalyticsSink, ConversionReporter, NullSink};
use crate::store::{AssignmentStore, KvStore, MemoryKvStore};

/// Sentinel variant returned for unknown or ineligible experiments.
pub const CONTROL_VARIANT: &str = "control";

/// Audience rule collaborator.
///
/// Rule identifiers are opaque strings carried on the definition; the
/// context consults the resolver only when about to create an assignment.
pub trait AudienceResolver: Send + Sync {
    /// Whether the current visitor satisfies the given rule.
    fn matches(&self, rule: &str) -> bool;
}

/// Resolver that admits every visitor. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllAudience;

impl AudienceResolver for AllowAllAudience {
    fn matches(&self, _rule: &str) -> bool {
        true
    }
}

/// The experiment assignment façade.
///
/// Per (experiment, visitor) the state machine is `Unassigned -> Assigned`,
/// terminal once assigned: the context always reads the store before
/// computing, so an existing assignment is never overwritten even if the
/// definition's weights changed since it was written.
///
/// # Example
///
/// ```rust
/// use sorteo::registry::ExperimentDefinition;
/// use sorteo::ExperimentContext;
///
/// # fn main() -> sorteo::Result<()> {
/// let context = ExperimentContext::builder()
///     .experiment(
///         ExperimentDefinition::builder("pricing_page_layout")
///             .variant("control", 50)
///             .variant("variant_a", 50)
///             .build()?,
///     )
///     .build();
///
/// let variant = context.get_variant("pricing_page_layout");
/// assert!(variant == "control" || variant == "variant_a");
///
/// context.track_conversion("pricing_page_layout", "signup", None);
/// # Ok(())
/// # }
/// ```
pub struct ExperimentContext {
    registry: ExperimentRegistry,
    assignments: AssignmentStore,
    identity: IdentityProvider,
    reporter: ConversionReporter,
    audience: Arc<dyn AudienceResolver>,
}

impl ExperimentContext {
    /// Create a builder for the context.
    #[must_use]
    pub fn builder() -> ExperimentContextBuilder {
        ExperimentContextBuilder::default()
    }

    /// Resolve the visitor's variant for an experiment.
    ///
    /// - Unknown experiment: returns `"control"`, persists nothing.
    /// - Known but ineligible (inactive or outside the date window):
    ///   returns `"control"`, persists nothing.
    /// - Known and eligible: returns the stored assignment if one exists
    ///   (verbatim - a key orphaned by a variant rename comes back
    ///   unresolved); otherwise selects deterministically, persists, reports
    ///   participation once, and returns the new variant.
    #[must_use]
    pub fn get_variant(&self, experiment_name: &str) -> String {
        let Some(definition) = self.registry.get(experiment_name) else {
            debug!(experiment = experiment_name, "unknown experiment, control");
            return CONTROL_VARIANT.to_string();
        };
        if !definition.is_eligible_at(Utc::now()) {
            debug!(experiment = experiment_name, "ineligible experiment, control");
            return CONTROL_VARIANT.to_string();
        }
        if let Some(stored) = self.assignments.get(experiment_name) {
            return stored;
        }
        self.assign(definition)
    }

    /// Whether the experiment may currently assign visitors.
    ///
    /// `false` for unknown experiments.
    #[must_use]
    pub fn is_test_active(&self, experiment_name: &str) -> bool {
        self.registry.is_eligible(experiment_name, Utc::now())
    }

    /// Attribute a conversion to the visitor's assigned variant.
    ///
    /// Resolves through [`Self::get_variant`], so a visitor converting on
    /// first contact is lazily assigned first and the reported variant
    /// matches that fresh assignment.
    pub fn track_conversion(
        &self,
        experiment_name: &str,
        conversion_type: &str,
        value: Option<f64>,
    ) {
        let variant = self.get_variant(experiment_name);
        self.reporter
            .report_conversion(experiment_name, &variant, conversion_type, value);
    }

    /// Create, persist, and report a fresh assignment.
    ///
    /// The read-compute-persist-report sequence has no suspension point, so
    /// within one session it cannot interleave with another caller.
    fn assign(&self, definition: &ExperimentDefinition) -> String {
        let admitted = definition
            .audience()
            .iter()
            .all(|rule| self.audience.matches(rule));
        if !admitted {
            debug!(experiment = definition.name(), "visitor outside audience, control");
            return CONTROL_VARIANT.to_string();
        }

        let identity = self.identity.get_or_create();
        let variant = engine::select_variant(definition, &identity).to_string();
        debug!(experiment = definition.name(), variant = %variant, "assigned");

        self.assignments.set(definition.name(), &variant);
        self.reporter.report_participation(definition.name(), &variant);
        variant
    }
}

/// Builder for [`ExperimentContext`].
///
/// Defaults: empty registry, in-memory store, discarding sink, allow-all
/// audience.
#[derive(Default)]
pub struct ExperimentContextBuilder {
    experiments: Vec<ExperimentDefinition>,
    kv: Option<Arc<dyn KvStore>>,
    sink: Option<Arc<dyn AnalyticsSink>>,
    audience: Option<Arc<dyn AudienceResolver>>,
}

impl ExperimentContextBuilder {
    /// Append one experiment definition. Order is preserved.
    #[must_use]
    pub fn experiment(mut self, definition: ExperimentDefinition) -> Self {
        self.experiments.push(definition);
        self
    }

    /// Supply the full definition list at once.
    #[must_use]
    pub fn experiments(mut self, definitions: Vec<ExperimentDefinition>) -> Self {
        self.experiments.extend(definitions);
        self
    }

    /// Set the KV backend shared by assignments and the visitor identity.
    #[must_use]
    pub fn store(mut self, kv: Arc<dyn KvStore>) -> Self {
        self.kv = Some(kv);
        self
    }

    /// Set the analytics sink events are delivered to.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn AnalyticsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set the audience resolver.
    #[must_use]
    pub fn audience(mut self, resolver: Arc<dyn AudienceResolver>) -> Self {
        self.audience = Some(resolver);
        self
    }

    /// Build the context.
    #[must_use]
    pub fn build(self) -> ExperimentContext {
        let kv = self
            .kv
            .unwrap_or_else(|| Arc::new(MemoryKvStore::new()) as Arc<dyn KvStore>);
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(NullSink) as Arc<dyn AnalyticsSink>);
        let audience = self
            .audience
            .unwrap_or_else(|| Arc::new(AllowAllAudience) as Arc<dyn AudienceResolver>);

        ExperimentContext {
            registry: ExperimentRegistry::new(self.experiments),
            assignments: AssignmentStore::new(Arc::clone(&kv)),
            identity: IdentityProvider::new(kv),
            reporter: ConversionReporter::new(sink),
            audience,
        }
    }
}

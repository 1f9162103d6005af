//! Conversion Reporter - participation and conversion events
//!
//! Events are forwarded to an external analytics collaborator through the
//! `AnalyticsSink` seam and are not retained by this crate. Delivery is
//! fire-and-forget: the reporter never inspects the outcome beyond logging
//! it, and failures never reach the caller or block rendering.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::Result;

/// Event name for first-time experiment participation.
pub const PARTICIPATION_EVENT: &str = "ab_test_participation";

/// Event name for a conversion attributed to a variant.
pub const CONVERSION_EVENT: &str = "ab_test_conversion";

/// External analytics collaborator interface.
///
/// Properties are a JSON object; the analytics side decides what to do with
/// them. Implementations should return quickly - a sink talking to the
/// network should enqueue, not block.
pub trait AnalyticsSink: Send + Sync {
    /// Deliver one event.
    ///
    /// # Errors
    ///
    /// Delivery failures may be returned; the reporter swallows them.
    fn emit(&self, event: &str, properties: Value) -> Result<()>;
}

/// Sink that discards every event. The default when no analytics
/// collaborator is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AnalyticsSink for NullSink {
    fn emit(&self, _event: &str, _properties: Value) -> Result<()> {
        Ok(())
    }
}

/// Sink that records events in memory, for tests and local debugging.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<(String, Value)>>,
}

impl MemorySink {
    /// Create an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the recorded `(event, properties)` pairs in emission order.
    ///
    /// # Panics
    ///
    /// Panics if a previous holder of the lock panicked.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().expect("sink lock poisoned").clone()
    }

    /// Count recorded events with the given name.
    #[must_use]
    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|(name, _)| name == event).count()
    }
}

impl AnalyticsSink for MemorySink {
    fn emit(&self, event: &str, properties: Value) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| crate::Error::Analytics("sink lock poisoned".to_string()))?
            .push((event.to_string(), properties));
        Ok(())
    }
}

/// Emits participation and conversion events tagged with experiment/variant.
#[derive(Clone)]
pub struct ConversionReporter {
    sink: Arc<dyn AnalyticsSink>,
}

impl ConversionReporter {
    /// Create a reporter over a shared sink.
    #[must_use]
    pub fn new(sink: Arc<dyn AnalyticsSink>) -> Self {
        Self { sink }
    }

    /// Report that a visitor was assigned to a variant.
    ///
    /// Called once per (experiment, visitor) at assignment creation, never
    /// on reads of an existing assignment.
    pub fn report_participation(&self, experiment_name: &str, variant_key: &str) {
        debug!(experiment = experiment_name, variant = variant_key, "participation");
        self.emit(
            PARTICIPATION_EVENT,
            json!({
                "test": experiment_name,
                "variant": variant_key,
            }),
        );
    }

    /// Report a conversion attributed to the visitor's assigned variant.
    pub fn report_conversion(
        &self,
        experiment_name: &str,
        variant_key: &str,
        conversion_type: &str,
        value: Option<f64>,
    ) {
        debug!(
            experiment = experiment_name,
            variant = variant_key,
            conversion_type,
            "conversion"
        );
        let mut properties = json!({
            "test": experiment_name,
            "variant": variant_key,
            "type": conversion_type,
        });
        if let (Some(value), Some(object)) = (value, properties.as_object_mut()) {
            object.insert("value".to_string(), json!(value));
        }
        self.emit(CONVERSION_EVENT, properties);
    }

    fn emit(&self, event: &str, properties: Value) {
        if let Err(e) = self.sink.emit(event, properties) {
            warn!(event, error = %e, "analytics delivery failed, event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participation_payload() {
        let sink = Arc::new(MemorySink::new());
        let reporter = ConversionReporter::new(Arc::clone(&sink) as Arc<dyn AnalyticsSink>);

        reporter.report_participation("exp", "variant_a");

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, PARTICIPATION_EVENT);
        assert_eq!(events[0].1, json!({"test": "exp", "variant": "variant_a"}));
    }

    #[test]
    fn test_conversion_payload_without_value() {
        let sink = Arc::new(MemorySink::new());
        let reporter = ConversionReporter::new(Arc::clone(&sink) as Arc<dyn AnalyticsSink>);

        reporter.report_conversion("exp", "control", "signup", None);

        let events = sink.events();
        assert_eq!(
            events[0].1,
            json!({"test": "exp", "variant": "control", "type": "signup"})
        );
    }

    #[test]
    fn test_conversion_payload_with_value() {
        let sink = Arc::new(MemorySink::new());
        let reporter = ConversionReporter::new(Arc::clone(&sink) as Arc<dyn AnalyticsSink>);

        reporter.report_conversion("exp", "control", "purchase", Some(49.0));

        let events = sink.events();
        assert_eq!(events[0].1["value"], json!(49.0));
    }

    /// Sink that always fails delivery.
    struct FailingSink;

    impl AnalyticsSink for FailingSink {
        fn emit(&self, _event: &str, _properties: Value) -> Result<()> {
            Err(crate::Error::Analytics("collector offline".to_string()))
        }
    }

    #[test]
    fn test_delivery_failure_is_swallowed() {
        let reporter = ConversionReporter::new(Arc::new(FailingSink));
        // must not panic or propagate
        reporter.report_participation("exp", "control");
        reporter.report_conversion("exp", "control", "signup", Some(1.0));
    }
}

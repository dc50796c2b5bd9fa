//! Flow metrics
//!
//! Events are recorded best effort: a failing sink is logged and otherwise
//! ignored, it never changes what the user sees.

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

/// View name reported for the reset form
pub const VIEW_NAME: &str = "complete-reset-password";

/// Entrypoint variation reported for this implementation of the view
pub const ENTRYPOINT_VARIATION: &str = "react";

#[derive(Debug, Error)]
#[error("metrics sink failed: {0}")]
pub struct MetricsError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowEvent {
    pub name: String,
    pub entrypoint_variation: &'static str,
    pub recorded_at: DateTime<Utc>,
}

impl FlowEvent {
    /// Page view of the reset form
    #[must_use]
    pub fn page_view() -> Self {
        Self::named(VIEW_NAME.to_string())
    }

    /// First interaction with the reset form
    #[must_use]
    pub fn engage() -> Self {
        Self::named(format!("{VIEW_NAME}.engage"))
    }

    fn named(name: String) -> Self {
        Self {
            name,
            entrypoint_variation: ENTRYPOINT_VARIATION,
            recorded_at: Utc::now(),
        }
    }
}

pub trait MetricsSink: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the event could not be stored.
    fn record(&self, event: &FlowEvent) -> Result<(), MetricsError>;
}

/// Sink that writes events to the application log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMetricsSink;

impl MetricsSink for LogMetricsSink {
    fn record(&self, event: &FlowEvent) -> Result<(), MetricsError> {
        info!(
            "📊 {} (entrypoint_variation={})",
            event.name, event.entrypoint_variation
        );
        Ok(())
    }
}

/// Record an event, logging instead of failing
pub fn record_best_effort(sink: &dyn MetricsSink, event: &FlowEvent) {
    if let Err(e) = sink.record(event) {
        warn!("Dropping metrics event {}: {e}", event.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl MetricsSink for FailingSink {
        fn record(&self, _event: &FlowEvent) -> Result<(), MetricsError> {
            Err(MetricsError("unavailable".to_string()))
        }
    }

    #[test]
    fn test_event_names() {
        assert_eq!(FlowEvent::page_view().name, "complete-reset-password");
        assert_eq!(FlowEvent::engage().name, "complete-reset-password.engage");
        assert_eq!(FlowEvent::engage().entrypoint_variation, "react");
    }

    #[test]
    fn test_failing_sink_is_swallowed() {
        record_best_effort(&FailingSink, &FlowEvent::page_view());
        record_best_effort(&LogMetricsSink, &FlowEvent::page_view());
    }
}

//! Observability
//!
//! - Structured JSON log lines on stderr
//! - Typed engine events
//! - Monotonic counters
//!
//! Observability is read-only: it never changes what the engine decides.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log an engine event with fields at its default severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    log_event_at(event, event.severity(), fields);
}

/// Log an engine event at an explicit severity
pub fn log_event_at(event: Event, severity: Severity, fields: &[(&str, &str)]) {
    Logger::log(severity, event.as_str(), fields);
}

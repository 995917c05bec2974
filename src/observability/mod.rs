//! Observability for the assembly pipeline
//!
//! - Structured JSON-line logging on stderr
//! - Typed lifecycle events
//! - Begin/complete scopes around long-running steps
//!
//! Observability never changes pipeline behavior: logging failures are
//! swallowed and nothing here returns an error.

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

/// Log a lifecycle event at INFO level
pub fn log_event(event: Event) {
    Logger::info(event.as_str(), &[]);
}

/// Log a lifecycle event with fields at INFO level
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::info(event.as_str(), fields);
}

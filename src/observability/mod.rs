//! Observability for relschema
//!
//! - Structured logging (JSON lines)
//! - Typed lifecycle events
//!
//! Only the CLI layer emits events; schema loading and validation stay pure.
//!
//! # Usage
//!
//! ```ignore
//! use relschema::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::SchemaLoaded, &[("definitions", "4")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

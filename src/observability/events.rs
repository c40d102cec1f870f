//! Observable lifecycle events
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Config file read (or defaults applied)
    ConfigLoaded,

    // Schemas
    /// Schema document parsed and checked
    SchemaLoaded,
    /// Schema document refused at load time
    SchemaRejected,
    /// Interface catalog populated
    CatalogLoaded,

    // Validation
    ValidationPassed,
    ValidationFailed,

    // Fixture matrix
    MatrixBegin,
    MatrixComplete,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::SchemaRejected => "SCHEMA_REJECTED",
            Event::CatalogLoaded => "CATALOG_LOADED",
            Event::ValidationPassed => "VALIDATION_PASSED",
            Event::ValidationFailed => "VALIDATION_FAILED",
            Event::MatrixBegin => "MATRIX_BEGIN",
            Event::MatrixComplete => "MATRIX_COMPLETE",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::SchemaRejected => Severity::Error,
            Event::ValidationFailed => Severity::Warn,
            Event::MatrixBegin => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! Schema error types
//!
//! Load errors (FATAL, never recovered):
//! - REL_SCHEMA_MALFORMED
//! - REL_SCHEMA_UNRESOLVED_REF
//! - REL_SCHEMA_REF_CYCLE
//! - REL_SCHEMA_INVALID_PATTERN
//!
//! Validation failures are not errors in this sense; they accumulate as
//! [`Violation`](super::report::Violation)s inside a report.

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Schema unusable, caller must stop
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Error codes raised while loading a schema document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Structural key missing or of the wrong type
    Malformed,
    /// `$ref` names a definition that does not exist
    UnresolvedReference,
    /// `$ref`/`allOf` chain loops back without consuming document structure
    ReferenceCycle,
    /// `pattern` is not a valid regular expression
    InvalidPattern,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::Malformed => "REL_SCHEMA_MALFORMED",
            SchemaErrorCode::UnresolvedReference => "REL_SCHEMA_UNRESOLVED_REF",
            SchemaErrorCode::ReferenceCycle => "REL_SCHEMA_REF_CYCLE",
            SchemaErrorCode::InvalidPattern => "REL_SCHEMA_INVALID_PATTERN",
        }
    }

    /// Every load error is fatal.
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error raised when a schema document cannot be turned into a node tree
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    /// JSON pointer into the schema document (e.g. "#/definitions/Ingester")
    location: String,
    message: String,
}

impl SchemaError {
    /// Structural key missing or of the wrong type
    pub fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::Malformed,
            location: location.into(),
            message: reason.into(),
        }
    }

    /// `$ref` target missing from the definition table
    pub fn unresolved_reference(location: impl Into<String>, name: &str) -> Self {
        Self {
            code: SchemaErrorCode::UnresolvedReference,
            location: location.into(),
            message: format!("Definition '{}' not found", name),
        }
    }

    /// Reference chain never reaches a structural keyword
    pub fn reference_cycle(chain: &[String]) -> Self {
        Self {
            code: SchemaErrorCode::ReferenceCycle,
            location: chain
                .first()
                .map(|name| format!("#/definitions/{}", name))
                .unwrap_or_else(|| "#".into()),
            message: format!("Reference cycle: {}", chain.join(" -> ")),
        }
    }

    pub fn invalid_pattern(
        location: impl Into<String>,
        pattern: &str,
        reason: impl fmt::Display,
    ) -> Self {
        Self {
            code: SchemaErrorCode::InvalidPattern,
            location: location.into(),
            message: format!("Invalid pattern '{}': {}", pattern, reason),
        }
    }

    /// Prefixes the location with the source the document came from (file path).
    pub fn in_source(mut self, source: impl fmt::Display) -> Self {
        self.location = format!("{}{}", source, self.location);
        self
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the location inside the schema document
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} (at {})",
            self.code.severity(),
            self.code.code(),
            self.message,
            self.location
        )
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaErrorCode::Malformed.code(), "REL_SCHEMA_MALFORMED");
        assert_eq!(SchemaErrorCode::UnresolvedReference.code(), "REL_SCHEMA_UNRESOLVED_REF");
        assert_eq!(SchemaErrorCode::ReferenceCycle.code(), "REL_SCHEMA_REF_CYCLE");
        assert_eq!(SchemaErrorCode::InvalidPattern.code(), "REL_SCHEMA_INVALID_PATTERN");
    }

    #[test]
    fn test_load_errors_are_fatal() {
        let err = SchemaError::malformed("#/properties", "expected object");
        assert!(err.is_fatal());
        assert_eq!(err.severity(), Severity::Fatal);
    }

    #[test]
    fn test_display_includes_code_and_location() {
        let err = SchemaError::unresolved_reference("#/properties/app", "AppData");
        let display = format!("{}", err);
        assert!(display.contains("FATAL"));
        assert!(display.contains("REL_SCHEMA_UNRESOLVED_REF"));
        assert!(display.contains("AppData"));
        assert!(display.contains("#/properties/app"));
    }

    #[test]
    fn test_reference_cycle_message() {
        let chain = vec!["A".to_string(), "B".to_string(), "A".to_string()];
        let err = SchemaError::reference_cycle(&chain);
        assert_eq!(err.location(), "#/definitions/A");
        assert!(err.message().contains("A -> B -> A"));
    }

    #[test]
    fn test_in_source_prefixes_location() {
        let err = SchemaError::malformed("#/required", "expected array").in_source("provider.json");
        assert_eq!(err.location(), "provider.json#/required");
    }
}

//! # Interface Errors

use thiserror::Error;

use crate::schema::SchemaError;

/// Result type for interface catalog operations
pub type InterfaceResult<T> = Result<T, InterfaceError>;

/// Relation interface errors
#[derive(Debug, Clone, Error)]
pub enum InterfaceError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Unknown interface: {0}")]
    UnknownInterface(String),

    #[error("Interface schema already registered: {0}")]
    AlreadyRegistered(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Invalid fixture {0}: {1}")]
    InvalidFixture(String, String),
}

impl InterfaceError {
    /// Stable error code for CLI output
    pub fn code(&self) -> &'static str {
        match self {
            InterfaceError::Schema(e) => e.code().code(),
            InterfaceError::UnknownInterface(_) => "REL_UNKNOWN_INTERFACE",
            InterfaceError::AlreadyRegistered(_) => "REL_INTERFACE_IMMUTABLE",
            InterfaceError::Io(_) => "REL_IO_ERROR",
            InterfaceError::Json(_) => "REL_JSON_ERROR",
            InterfaceError::InvalidFixture(_, _) => "REL_INVALID_FIXTURE",
        }
    }
}

impl From<std::io::Error> for InterfaceError {
    fn from(e: std::io::Error) -> Self {
        InterfaceError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for InterfaceError {
    fn from(e: serde_json::Error) -> Self {
        InterfaceError::Json(e.to_string())
    }
}
